use anyhow::Context;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

use crate::catalog::InspectionField;
use crate::dhis2::Dhis2Client;
use crate::form::InspectionForm;
use crate::models::{Event, InspectionRecord, School};
use crate::navigation::{AppState, Transition, View};
use crate::pagination::{Pager, PAGE_SIZE_CHOICES};
use crate::payload::{build_event_payload, Presence};
use crate::report::inspection_detail;
use crate::school::{build_school_payload, NewSchoolForm};

const HELP: &str = "\
Commands:
  search <term>   filter schools by name
  next | prev     move between pages
  size <n>        rows per page (10, 20, 30, 40 or 50)
  open <row>      show a school's inspections
  view <row>      show one inspection
  inspect [row]   record a new inspection for the open school, or the school on that row
  new-school      register a new school
  back            return to the school list
  help            show this help
  quit            leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Next,
    Previous,
    Size(u32),
    Open(usize),
    View(usize),
    Inspect(Option<usize>),
    NewSchool,
    Back,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let row = |rest: &str| {
        rest.parse::<usize>()
            .ok()
            .filter(|row| *row > 0)
            .ok_or_else(|| format!("expected a row number, got {rest:?}"))
    };

    match word.to_ascii_lowercase().as_str() {
        "search" | "s" => Ok(Command::Search(rest.to_string())),
        "next" | "n" => Ok(Command::Next),
        "prev" | "previous" | "p" => Ok(Command::Previous),
        "size" => rest
            .parse::<u32>()
            .ok()
            .filter(|size| PAGE_SIZE_CHOICES.contains(size))
            .map(Command::Size)
            .ok_or_else(|| format!("page size must be one of {PAGE_SIZE_CHOICES:?}")),
        "open" | "o" => row(rest).map(Command::Open),
        "view" | "v" => row(rest).map(Command::View),
        "inspect" | "i" if rest.is_empty() => Ok(Command::Inspect(None)),
        "inspect" | "i" => row(rest).map(|row| Command::Inspect(Some(row))),
        "new-school" => Ok(Command::NewSchool),
        "back" | "b" => Ok(Command::Back),
        "help" | "?" | "" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command {other:?}, type help")),
    }
}

/// Interactive walk through schools and their inspections.
pub struct Session<'a> {
    client: &'a Dhis2Client,
    presence: Presence,
    state: AppState,
    search: String,
    schools: Vec<School>,
    school_pager: Pager,
    inspections: Vec<Event>,
    inspection_pager: Pager,
    input: Lines<BufReader<Stdin>>,
}

impl<'a> Session<'a> {
    pub fn new(client: &'a Dhis2Client, presence: Presence) -> Self {
        Self {
            client,
            presence,
            state: AppState::default(),
            search: String::new(),
            schools: Vec::new(),
            school_pager: Pager::default(),
            inspections: Vec::new(),
            inspection_pager: Pager::default(),
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!("{HELP}");
        self.load_schools().await?;

        while let Some(line) = self.prompt("> ").await? {
            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(message) => {
                    println!("{message}");
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            if let Err(err) = self.handle(command).await {
                warn!(error = %err, "command failed");
                println!("Error: {err:#}");
            }
        }
        Ok(())
    }

    async fn prompt(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        use std::io::Write;
        print!("{label}");
        std::io::stdout().flush()?;
        self.input.next_line().await.context("failed to read input")
    }

    async fn handle(&mut self, command: Command) -> anyhow::Result<()> {
        match (self.state.view, command) {
            (_, Command::Help) => println!("{HELP}"),
            (View::Schools, Command::Search(term)) => {
                self.search = term;
                self.school_pager.restart();
                self.load_schools().await?;
            }
            (View::Schools, Command::Size(size)) => {
                self.school_pager.set_page_size(size);
                self.load_schools().await?;
            }
            (View::Schools, Command::Next) => {
                if self.school_pager.next() {
                    self.load_schools().await?;
                } else {
                    println!("Already on the last page.");
                }
            }
            (View::Schools, Command::Previous) => {
                if self.school_pager.previous() {
                    self.load_schools().await?;
                } else {
                    println!("Already on the first page.");
                }
            }
            (View::Schools, Command::Open(row)) => {
                let school = self
                    .schools
                    .get(row - 1)
                    .cloned()
                    .with_context(|| format!("no school on row {row}"))?;
                self.state.apply(Transition::OpenSchool(school));
                self.inspection_pager = Pager::default();
                self.load_inspections().await?;
            }
            (View::SchoolInfo, Command::Next) => {
                if self.inspection_pager.next() {
                    self.load_inspections().await?;
                } else {
                    println!("Already on the last page.");
                }
            }
            (View::SchoolInfo, Command::Previous) => {
                if self.inspection_pager.previous() {
                    self.load_inspections().await?;
                } else {
                    println!("Already on the first page.");
                }
            }
            (View::SchoolInfo, Command::View(row)) => {
                let event = self
                    .inspections
                    .get(row - 1)
                    .with_context(|| format!("no inspection on row {row}"))?;
                let record = InspectionRecord::from_event(event, self.client.catalog());
                println!("{}", inspection_detail(&record));
            }
            (View::Schools, Command::Inspect(row)) => {
                self.state.apply(Transition::StartInspection);
                let picked = row.and_then(|row| self.schools.get(row - 1).cloned());
                let outcome = match picked {
                    Some(school) => {
                        self.state.apply(Transition::SelectSchool(school));
                        self.enter_inspection().await
                    }
                    None => Err(anyhow::anyhow!(
                        "Please select a school: give its row, e.g. inspect 2"
                    )),
                };
                self.state.apply(Transition::ShowSchools);
                outcome?;
            }
            (View::Schools, Command::NewSchool) => {
                self.state.apply(Transition::StartSchool);
                let outcome = self.enter_school().await;
                self.state.apply(Transition::ShowSchools);
                outcome?;
                self.load_schools().await?;
            }
            (View::SchoolInfo, Command::Inspect(_)) => {
                let school = self.state.selected_school();
                self.state.apply(Transition::InspectSelected);
                let outcome = self.enter_inspection().await;
                if let Some(school) = school {
                    self.state.apply(Transition::OpenSchool(school));
                }
                outcome?;
                self.load_inspections().await?;
            }
            (_, Command::Back) => {
                self.state.apply(Transition::ShowSchools);
                self.load_schools().await?;
            }
            (view, command) => println!("{command:?} is not available in the {view:?} view."),
        }
        Ok(())
    }

    async fn load_schools(&mut self) -> anyhow::Result<()> {
        let search = Some(self.search.as_str()).filter(|term| !term.is_empty());
        let page = self
            .client
            .search_schools(search, self.school_pager.page, self.school_pager.page_size)
            .await?;
        self.school_pager
            .record_total(page.pager.total.unwrap_or(page.items.len() as u64));
        self.schools = page.items;

        println!("View schools and inspections");
        if self.schools.is_empty() {
            println!("No schools found");
        }
        for (index, school) in self.schools.iter().enumerate() {
            let latest = self.client.latest_inspection(&school.id).await?;
            let (date, condition) = match &latest {
                Some(event) => {
                    let record = InspectionRecord::from_event(event, self.client.catalog());
                    (record.date.clone(), record.condition_label().to_string())
                }
                None => ("No inspection".to_string(), "Not defined".to_string()),
            };
            println!("{:>3}. {:<40} {:<14} {}", index + 1, school.name, date, condition);
        }
        println!("{}", self.school_pager.summary());
        Ok(())
    }

    async fn load_inspections(&mut self) -> anyhow::Result<()> {
        let page = self
            .client
            .list_inspections(
                &self.state.school_id,
                self.inspection_pager.page,
                self.inspection_pager.page_size,
            )
            .await?;
        self.inspection_pager
            .record_total(page.pager.total.unwrap_or(page.items.len() as u64));
        self.inspections = page.items;

        println!("{}", self.state.school_name);
        if self.inspections.is_empty() {
            println!("No available inspections");
        }
        for (index, event) in self.inspections.iter().enumerate() {
            let record = InspectionRecord::from_event(event, self.client.catalog());
            println!(
                "{:>3}. {:<14} {:<12} {:<11} {}",
                index + 1,
                record.id,
                record.date,
                record.status,
                record.condition_label()
            );
        }
        println!("{}", self.inspection_pager.summary());
        Ok(())
    }

    async fn enter_inspection(&mut self) -> anyhow::Result<()> {
        let school = self
            .state
            .selected_school()
            .context("open a school before starting an inspection")?;
        println!("Create new inspection for {}", school.name);

        let Some(date) = self.prompt("Inspection date (YYYY-MM-DD): ").await? else {
            return Ok(());
        };
        let mut form = InspectionForm::new(&school.id, &school.name, date.trim());
        for field in InspectionField::NUMERIC {
            let Some(value) = self.prompt(&format!("{}: ", field.label())).await? else {
                return Ok(());
            };
            form.set(field, &value)?;
        }
        form.validate()?;
        println!(
            "School condition: {}",
            form.condition().unwrap_or("Not defined")
        );

        let answer = self
            .prompt("Are you sure you want to submit the school inspection? [y/N] ")
            .await?
            .unwrap_or_default();
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Inspection discarded.");
            return Ok(());
        }

        let payload = build_event_payload(&form, self.client.catalog(), self.presence);
        self.client.create_inspection(&payload).await?;
        form.reset();
        println!("School inspection submitted");
        Ok(())
    }

    async fn enter_school(&mut self) -> anyhow::Result<()> {
        println!("Create new school");
        let Some(name) = self.prompt("School name: ").await? else {
            return Ok(());
        };
        let Some(coordinates) = self
            .prompt("Geo-coordinates (e.g. 34.0522° N, 118.2437° W): ")
            .await?
        else {
            return Ok(());
        };
        let school = NewSchoolForm { name, coordinates }.validate()?;
        println!("{} at {}", school.name, school.location);

        let answer = self
            .prompt("Are you sure you want to submit the school report? [y/N] ")
            .await?
            .unwrap_or_default();
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("School discarded.");
            return Ok(());
        }

        let catalog = self.client.catalog();
        let opened = Utc::now().date_naive();
        let payload = build_school_payload(&school, &catalog.school_parent, opened);
        self.client.create_school(&payload).await?;
        println!("School report submitted");
        Ok(())
    }
}
