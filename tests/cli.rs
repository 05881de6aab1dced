use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("school-inspections").unwrap();
    cmd.env_remove("DHIS2_BASE_URL")
        .env_remove("DHIS2_USERNAME")
        .env_remove("DHIS2_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

const COUNTS: [&str; 12] = [
    "--students",
    "50",
    "--seats",
    "60",
    "--textbooks",
    "60",
    "--classrooms",
    "1",
    "--teachers",
    "2",
    "--student-toilets",
    "3",
];

#[test]
fn classify_good_school() {
    cmd()
        .arg("classify")
        .args(COUNTS)
        .assert()
        .success()
        .stdout("Good\n");
}

#[test]
fn classify_crowded_classroom() {
    cmd()
        .args(["classify", "--students", "54", "--seats", "60", "--textbooks", "60"])
        .args(["--classrooms", "1", "--teachers", "2", "--student-toilets", "3"])
        .assert()
        .success()
        .stdout("Poor\n");
}

#[test]
fn lenient_classify_skips_unreadable_counts() {
    cmd()
        .args(["classify", "--students", "50", "--seats", "lots", "--textbooks", "60"])
        .args(["--classrooms", "1", "--teachers", "2", "--student-toilets", "3"])
        .assert()
        .success()
        .stdout("Good\n");
}

#[test]
fn strict_classify_rejects_unreadable_counts() {
    cmd()
        .args(["classify", "--strict", "--students", "50", "--seats", "lots"])
        .args(["--textbooks", "60", "--classrooms", "1", "--teachers", "2"])
        .args(["--student-toilets", "3"])
        .assert()
        .failure()
        .stderr(contains("Seats for students must be a whole number"));
}

#[test]
fn dry_run_inspection_leaves_out_zero_seats() {
    cmd()
        .args(["new-inspection", "--school", "ou1", "--date", "2024-05-01"])
        .args(["--students", "30", "--seats", "0", "--textbooks", "60"])
        .args(["--classrooms", "1", "--teachers", "2", "--student-toilets", "3"])
        .args(["--teacher-toilets", "1", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("CnukMdcvvZ2"))
        .stdout(contains("\"status\": \"COMPLETED\""))
        .stdout(contains("\"value\": \"Poor\""))
        .stdout(contains("txJa0dnZI04").not());
}

#[test]
fn keep_zero_sends_zero_seats() {
    cmd()
        .args(["new-inspection", "--school", "ou1", "--date", "2024-05-01"])
        .args(["--students", "30", "--seats", "0", "--textbooks", "60"])
        .args(["--classrooms", "1", "--teachers", "2", "--student-toilets", "3"])
        .args(["--teacher-toilets", "1", "--dry-run", "--keep-zero"])
        .assert()
        .success()
        .stdout(contains("txJa0dnZI04"));
}

#[test]
fn inspection_with_bad_date_is_refused() {
    cmd()
        .args(["new-inspection", "--school", "ou1", "--date", "01/05/2024"])
        .args(COUNTS)
        .args(["--teacher-toilets", "1", "--dry-run"])
        .assert()
        .failure()
        .stderr(contains("YYYY-MM-DD"));
}

#[test]
fn catalog_file_overrides_program() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("catalog.json");
    std::fs::write(
        &path,
        r#"{
            "program": "Abc123Xyz00",
            "programStage": "Stage000001",
            "schoolParent": "Parent00001",
            "dataElements": {
                "seatsForStudents": "de000000001",
                "numberOfStudents": "de000000002",
                "numberOfTextbooks": "de000000003",
                "numberOfClassrooms": "de000000004",
                "numberOfTeachers": "de000000005",
                "toiletsForTeachers": "de000000006",
                "toiletsForStudents": "de000000007",
                "condition": "de000000008"
            }
        }"#,
    )
    .unwrap();

    cmd()
        .arg("--catalog")
        .arg(&path)
        .args(["new-inspection", "--school", "ou1", "--date", "2024-05-01"])
        .args(COUNTS)
        .args(["--teacher-toilets", "1", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("Abc123Xyz00"))
        .stdout(contains("de000000008"));
}

#[test]
fn dry_run_school_uses_point_geometry() {
    cmd()
        .args(["new-school", "--name", "Bo Town School"])
        .args(["--coordinates", "-8.4657, 13.2317", "--opened", "2024-09-01", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("\"type\": \"Point\""))
        .stdout(contains("\"openingDate\": \"2024-09-01\""))
        .stdout(contains("Jj1IUjjPaWf"));
}

#[test]
fn school_without_location_is_refused() {
    cmd()
        .args(["new-school", "--name", "Bo Town School", "--coordinates", ""])
        .args(["--dry-run"])
        .assert()
        .failure()
        .stderr(contains("Geo-Coordinates are required"));
}

#[test]
fn import_dry_run_validates_rows() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("inspections.csv");
    std::fs::write(
        &path,
        "school_id,school_name,inspection_date,seats_for_students,number_of_students,number_of_textbooks,number_of_classrooms,number_of_teachers,toilets_for_teachers,toilets_for_students\n\
         ou1,Jambalaya Primary,2024-05-01,60,50,60,1,2,1,3\n\
         ou2,Bo Town School,2024-05-02,60,54,60,1,2,1,3\n",
    )
    .unwrap();

    cmd()
        .arg("import")
        .arg("--csv")
        .arg(&path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(contains("- ou1 on 2024-05-01: Good"))
        .stdout(contains("- ou2 on 2024-05-02: Poor"))
        .stdout(contains("Validated 2 inspections"));
}

#[test]
fn online_commands_need_connection_settings() {
    cmd()
        .args(["schools"])
        .assert()
        .failure()
        .stderr(contains("DHIS2_BASE_URL must be set"));
}

#[test]
fn page_numbers_start_at_one() {
    cmd()
        .args(["inspections", "--school", "ou1", "--page", "0"])
        .assert()
        .failure()
        .stderr(contains("--page"))
        .stderr(contains("DHIS2_BASE_URL").not());
}
