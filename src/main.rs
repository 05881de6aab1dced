use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

mod browse;
mod catalog;
mod condition;
mod config;
mod dhis2;
mod form;
mod import;
mod models;
mod navigation;
mod pagination;
mod payload;
mod report;
mod school;

use catalog::{Catalog, InspectionField};
use config::Config;
use dhis2::Dhis2Client;
use form::InspectionForm;
use models::{FieldValues, InspectionRecord};
use payload::{build_event_payload, Presence};
use school::{build_school_payload, NewSchoolForm};

const REPORT_PAGE_SIZE: u32 = 50;

#[derive(Parser)]
#[command(name = "school-inspections")]
#[command(about = "Record and review school facility inspections on DHIS2", long_about = None)]
struct Cli {
    /// JSON file overriding the program and data element identifiers
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CountArgs {
    #[arg(long, allow_hyphen_values = true)]
    students: String,
    #[arg(long, allow_hyphen_values = true)]
    seats: String,
    #[arg(long, allow_hyphen_values = true)]
    textbooks: String,
    #[arg(long, allow_hyphen_values = true)]
    classrooms: String,
    #[arg(long, allow_hyphen_values = true)]
    teachers: String,
    #[arg(long, allow_hyphen_values = true)]
    student_toilets: String,
}

impl CountArgs {
    fn values(&self) -> FieldValues {
        [
            (InspectionField::NumberOfStudents, &self.students),
            (InspectionField::SeatsForStudents, &self.seats),
            (InspectionField::NumberOfTextbooks, &self.textbooks),
            (InspectionField::NumberOfClassrooms, &self.classrooms),
            (InspectionField::NumberOfTeachers, &self.teachers),
            (InspectionField::ToiletsForStudents, &self.student_toilets),
        ]
        .into_iter()
        .map(|(field, value)| (field, value.clone()))
        .collect()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List schools with their latest inspection
    Schools {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
        page_size: u32,
    },
    /// List inspections recorded for one school
    Inspections {
        #[arg(long)]
        school: String,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
        page_size: u32,
    },
    /// Show the values recorded by one inspection
    Show {
        #[arg(long)]
        event: String,
    },
    /// Derive the school condition from counts without contacting DHIS2
    Classify {
        #[command(flatten)]
        counts: CountArgs,
        /// Fail on non-numeric counts instead of skipping their checks
        #[arg(long)]
        strict: bool,
    },
    /// Record a new inspection
    NewInspection {
        #[arg(long)]
        school: String,
        #[arg(long)]
        date: String,
        #[command(flatten)]
        counts: CountArgs,
        #[arg(long, allow_hyphen_values = true)]
        teacher_toilets: String,
        /// Send zero counts instead of leaving them out
        #[arg(long)]
        keep_zero: bool,
        /// Print the request instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Register a new school with its location
    NewSchool {
        #[arg(long)]
        name: String,
        /// "lat, lng" or "34.0522° N, 118.2437° W"
        #[arg(long, allow_hyphen_values = true)]
        coordinates: String,
        /// Defaults to today
        #[arg(long)]
        opened: Option<NaiveDate>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Import inspections from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        keep_zero: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate a markdown report of a school's inspections
    Report {
        #[arg(long)]
        school: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Browse schools and inspections interactively
    Browse {
        #[arg(long)]
        keep_zero: bool,
    },
}

fn presence(keep_zero: bool) -> Presence {
    if keep_zero {
        Presence::NonEmpty
    } else {
        Presence::Truthy
    }
}

fn connect(catalog: Catalog) -> anyhow::Result<Dhis2Client> {
    let config = Config::from_env(catalog)?;
    let client = Dhis2Client::new(&config).context("failed to build the DHIS2 client")?;
    Ok(client)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = Catalog::load(cli.catalog.as_deref())?;

    match cli.command {
        Commands::Schools {
            search,
            page,
            page_size,
        } => {
            let client = connect(catalog)?;
            let schools = client
                .search_schools(search.as_deref(), page, page_size)
                .await?;
            let mut pager = pagination::Pager {
                page,
                page_size,
                total_items: 0,
            };
            pager.record_total(schools.pager.total.unwrap_or(schools.items.len() as u64));

            if schools.items.is_empty() {
                println!("No schools found");
                return Ok(());
            }

            println!("Schools ({}):", pager.summary());
            for school in schools.items.iter() {
                let latest = client.latest_inspection(&school.id).await?;
                match latest {
                    Some(event) => {
                        let record = InspectionRecord::from_event(&event, client.catalog());
                        println!(
                            "- {} ({}) latest inspection {} condition {}",
                            school.name,
                            school.id,
                            record.date,
                            record.condition_label()
                        );
                    }
                    None => println!("- {} ({}) No inspection", school.name, school.id),
                }
            }
        }
        Commands::Inspections {
            school,
            page,
            page_size,
        } => {
            let client = connect(catalog)?;
            let inspections = client.list_inspections(&school, page, page_size).await?;
            let mut pager = pagination::Pager {
                page,
                page_size,
                total_items: 0,
            };
            pager.record_total(
                inspections
                    .pager
                    .total
                    .unwrap_or(inspections.items.len() as u64),
            );

            if inspections.items.is_empty() {
                println!("No available inspections");
                return Ok(());
            }

            println!("Inspections ({}):", pager.summary());
            for event in inspections.items.iter() {
                let record = InspectionRecord::from_event(event, client.catalog());
                println!(
                    "- {} on {} ({}): {}",
                    record.id,
                    record.date,
                    record.status,
                    record.condition_label()
                );
            }
        }
        Commands::Show { event } => {
            let client = connect(catalog)?;
            let event = client.fetch_inspection(&event).await?;
            let record = InspectionRecord::from_event(&event, client.catalog());
            print!("{}", report::inspection_detail(&record));
        }
        Commands::Classify { counts, strict } => {
            let values = counts.values();
            let label = if strict {
                condition::try_classify(&values)?
            } else {
                condition::classify(&condition::Counts::parse(&values))
            };
            println!("{label}");
        }
        Commands::NewInspection {
            school,
            date,
            counts,
            teacher_toilets,
            keep_zero,
            dry_run,
        } => {
            let mut form = InspectionForm::new(&school, "", &date);
            for (field, value) in counts.values() {
                form.set(field, &value)?;
            }
            form.set(InspectionField::ToiletsForTeachers, &teacher_toilets)?;
            form.validate()?;

            let payload = build_event_payload(&form, &catalog, presence(keep_zero));
            if dry_run {
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }

            let client = connect(catalog)?;
            let references = client.create_inspection(&payload).await?;
            form.reset();
            println!(
                "School inspection submitted ({}).",
                references.join(", ")
            );
        }
        Commands::NewSchool {
            name,
            coordinates,
            opened,
            dry_run,
        } => {
            let school = NewSchoolForm { name, coordinates }.validate()?;
            let opened = opened.unwrap_or_else(|| Utc::now().date_naive());
            let payload = build_school_payload(&school, &catalog.school_parent, opened);
            if dry_run {
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }

            let client = connect(catalog)?;
            let uid = client.create_school(&payload).await?;
            println!(
                "School {} registered at {} ({}).",
                school.name,
                school.location,
                uid.as_deref().unwrap_or("id pending")
            );
        }
        Commands::Import {
            csv,
            keep_zero,
            dry_run,
        } => {
            let forms = import::read_inspections_csv(&csv)?;
            for form in forms.iter() {
                println!(
                    "- {} on {}: {}",
                    form.school_id,
                    form.inspection_date,
                    form.condition().unwrap_or("Not defined")
                );
            }

            if dry_run {
                println!("Validated {} inspections from {}.", forms.len(), csv.display());
                return Ok(());
            }

            let client = connect(catalog)?;
            let rule = presence(keep_zero);
            let mut submitted = 0usize;
            for form in forms.iter() {
                let payload = build_event_payload(form, client.catalog(), rule);
                client
                    .create_inspection(&payload)
                    .await
                    .with_context(|| {
                        format!(
                            "submitting inspection for {} on {} failed after {submitted} succeeded",
                            form.school_id, form.inspection_date
                        )
                    })?;
                submitted += 1;
            }
            info!(submitted, "import finished");
            println!("Submitted {submitted} inspections from {}.", csv.display());
        }
        Commands::Report { school, out } => {
            let client = connect(catalog)?;
            let mut records = Vec::new();
            let mut page = 1;
            loop {
                let batch = client
                    .list_inspections(&school, page, REPORT_PAGE_SIZE)
                    .await?;
                records.extend(
                    batch
                        .items
                        .iter()
                        .map(|event| InspectionRecord::from_event(event, client.catalog())),
                );
                let last_page = batch.pager.page_count.unwrap_or(page);
                if page >= last_page {
                    break;
                }
                page += 1;
            }

            let school_name = records
                .iter()
                .map(|record| record.school_name.as_str())
                .find(|name| !name.is_empty())
                .unwrap_or(school.as_str())
                .to_string();
            let report = report::build_report(&school_name, Utc::now().date_naive(), &records);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Browse { keep_zero } => {
            let client = connect(catalog)?;
            browse::Session::new(&client, presence(keep_zero)).run().await?;
        }
    }

    Ok(())
}
