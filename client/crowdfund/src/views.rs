//! Project listing and creation views.
//!
//! Views only orchestrate: they call the adapter, keep what it returns, and
//! after every mutating call wait for confirmation and re-read the affected
//! project. Funding totals are never recomputed locally. Each view catches
//! its own failures and keeps a user-facing message for display.

use std::fmt::Write as _;

use alloy_primitives::Address;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::error;

use crate::contract::{ContractService, CreatedProject};
use crate::errors::{Error, Result};
use crate::project::Project;

const PROGRESS_CELLS: u32 = 20;

// ─────────────────────────────────────────────────────────
// Listing
// ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ProjectListView {
    projects: Vec<Project>,
    error: Option<String>,
}

impl ProjectListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch every project. A single failed read fails the whole load.
    pub async fn load(&mut self, service: &ContractService) -> Result<()> {
        match service.list_projects().await {
            Ok(projects) => {
                self.projects = projects;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                error!("Error fetching projects: {e}");
                self.projects.clear();
                self.error = Some("Failed to load projects. Please try again later.".to_string());
                Err(e)
            }
        }
    }

    pub async fn contribute(
        &mut self,
        service: &ContractService,
        project_id: u64,
        amount: &str,
    ) -> Result<&Project> {
        let outcome = async {
            let tx = service.contribute(project_id, amount).await?;
            service.wait(&tx).await?;
            service.get_project_details(project_id).await
        }
        .await;
        self.apply(outcome, "Failed to contribute. Please try again.")
    }

    pub async fn withdraw(
        &mut self,
        service: &ContractService,
        project_id: u64,
    ) -> Result<&Project> {
        let outcome = async {
            let tx = service.withdraw_funds(project_id).await?;
            service.wait(&tx).await?;
            service.get_project_details(project_id).await
        }
        .await;
        self.apply(outcome, "Failed to withdraw funds. Please try again.")
    }

    fn apply(&mut self, outcome: Result<Project>, message: &str) -> Result<&Project> {
        let updated = outcome.map_err(|e| {
            error!("{message} ({e})");
            self.error = Some(message.to_string());
            e
        })?;
        Ok(self.upsert(updated))
    }

    /// Replace the project with the same id, or append it.
    pub fn upsert(&mut self, project: Project) -> &Project {
        let index = match self.projects.iter().position(|p| p.id == project.id) {
            Some(i) => {
                self.projects[i] = project;
                i
            }
            None => {
                self.projects.push(project);
                self.projects.len() - 1
            }
        };
        &self.projects[index]
    }

    /// Plain-text rendering; `viewer` enables the creator-only actions.
    pub fn render(&self, viewer: Option<&Address>, now: DateTime<Utc>, symbol: &str) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }
        if self.projects.is_empty() {
            return "No projects found. Create a new project to get started!".to_string();
        }

        let mut out = String::from("Crowdfunding Projects\n");
        for p in &self.projects {
            render_project(&mut out, p, viewer, now, symbol);
        }
        out
    }
}

// ─────────────────────────────────────────────────────────
// Detail
// ─────────────────────────────────────────────────────────

/// One project with its contributor count.
#[derive(Debug, Default)]
pub struct ProjectDetailView {
    project: Option<Project>,
    contributors: u64,
    viewer_is_creator: bool,
    error: Option<String>,
}

impl ProjectDetailView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn load(
        &mut self,
        service: &ContractService,
        project_id: u64,
        viewer: Option<&Address>,
    ) -> Result<()> {
        let outcome = async {
            let project = service.get_project_details(project_id).await?;
            let contributors = service.get_contributor_count(project_id).await?;
            Ok::<_, Error>((project, contributors))
        }
        .await;

        match outcome {
            Ok((project, contributors)) => {
                self.viewer_is_creator = match viewer {
                    Some(v) => service.is_project_creator(project_id, &v.to_string()).await,
                    None => false,
                };
                self.project = Some(project);
                self.contributors = contributors;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                error!("Error fetching project {project_id}: {e}");
                self.project = None;
                self.error = Some("Failed to load project. Please try again later.".to_string());
                Err(e)
            }
        }
    }

    pub fn render(&self, viewer: Option<&Address>, now: DateTime<Utc>, symbol: &str) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }
        let Some(project) = &self.project else {
            return "Project not loaded.".to_string();
        };
        let mut out = String::new();
        render_project(&mut out, project, viewer, now, symbol);
        let _ = writeln!(out, "    Contributors: {}", self.contributors);
        if self.viewer_is_creator {
            let _ = writeln!(out, "    You created this project.");
        }
        out
    }
}

fn render_project(
    out: &mut String,
    p: &Project,
    viewer: Option<&Address>,
    now: DateTime<Utc>,
    symbol: &str,
) {
    let _ = writeln!(
        out,
        "#{} {}{}",
        p.id,
        p.title,
        if p.is_completed { " [Completed]" } else { "" }
    );
    let _ = writeln!(out, "    {}", p.description);
    let deadline = p
        .deadline_date()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| p.deadline.to_string());
    let _ = writeln!(
        out,
        "    Goal: {} {symbol} | Raised: {} {symbol} | Deadline: {deadline}",
        ContractService::format_currency(p.funding_goal),
        ContractService::format_currency(p.current_funding),
    );
    let _ = writeln!(
        out,
        "    {} {:.2}%",
        progress_bar(p.progress_basis_points()),
        p.progress_percent()
    );

    let mut actions = Vec::new();
    if p.accepts_contributions(now) {
        actions.push("contribute");
    }
    if viewer.is_some_and(|v| p.can_withdraw(v, now)) {
        actions.push("withdraw");
    }
    if !actions.is_empty() {
        let _ = writeln!(out, "    Actions: {}", actions.join(", "));
    }
}

fn progress_bar(basis_points: u32) -> String {
    let filled = (basis_points * PROGRESS_CELLS / 10_000).min(PROGRESS_CELLS);
    format!(
        "[{}{}]",
        "#".repeat(filled as usize),
        "-".repeat((PROGRESS_CELLS - filled) as usize)
    )
}

// ─────────────────────────────────────────────────────────
// Creation
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    /// Decimal amount in the native currency.
    pub funding_goal: String,
    /// `YYYY-MM-DD`, taken as midnight UTC.
    pub deadline: String,
    /// Value paid along with the creation call.
    pub value_to_send: String,
}

impl Default for ProjectForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            funding_goal: String::new(),
            deadline: String::new(),
            value_to_send: "0.1".to_string(),
        }
    }
}

impl ProjectForm {
    pub fn is_complete(&self) -> bool {
        [&self.title, &self.description, &self.funding_goal, &self.deadline]
            .iter()
            .all(|f| !f.trim().is_empty())
    }

    pub fn deadline(&self) -> Result<DateTime<Utc>> {
        let date = NaiveDate::parse_from_str(self.deadline.trim(), "%Y-%m-%d").map_err(|e| {
            Error::InvalidInput(format!("deadline '{}' is not YYYY-MM-DD: {e}", self.deadline))
        })?;
        date.and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .ok_or_else(|| Error::InvalidInput(format!("invalid deadline '{}'", self.deadline)))
    }
}

#[derive(Debug, Default)]
pub struct CreateProjectView {
    pub form: ProjectForm,
    error: Option<String>,
    debug_log: Vec<String>,
}

impl CreateProjectView {
    pub fn new(form: ProjectForm) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Troubleshooting trail, including raw error payloads.
    pub fn debug_log(&self) -> &[String] {
        &self.debug_log
    }

    /// Submit the form, wait for confirmation and reset the form on success.
    pub async fn submit(&mut self, service: &ContractService, symbol: &str) -> Result<CreatedProject> {
        if !self.form.is_complete() {
            let message = "Please fill in all fields".to_string();
            self.error = Some(message.clone());
            return Err(Error::InvalidInput(message));
        }

        self.error = None;
        self.debug_log.clear();
        self.debug_log.push("Attempting to create project...".to_string());

        let deadline = match self.form.deadline() {
            Ok(d) => d,
            Err(e) => return Err(self.fail(e)),
        };

        let form = self.form.clone();
        if let Some(from) = service.signer_address() {
            self.debug_log.push(format!("Sending from {from}"));
        }
        self.debug_log.push(format!(
            "Preparing transaction with parameters:\nTitle: {}\nDescription: {}\nFunding Goal: {} {symbol}\nDeadline: {}\nSending: {} {symbol}",
            form.title,
            form.description,
            form.funding_goal,
            deadline.to_rfc3339(),
            form.value_to_send,
        ));

        let submitted = service
            .create_project(
                &form.title,
                &form.description,
                &form.funding_goal,
                deadline,
                &form.value_to_send,
            )
            .await;
        let created = match submitted {
            Ok(created) => created,
            Err(e) => return Err(self.fail(e)),
        };
        self.debug_log.push(format!(
            "Transaction sent via {} (attempt {}): {}\nWaiting for confirmation...",
            created.signature, created.attempt, created.tx.hash
        ));

        if let Err(e) = service.wait(&created.tx).await {
            return Err(self.fail(e));
        }
        self.debug_log.push("Transaction confirmed!".to_string());
        self.form = ProjectForm::default();
        Ok(created)
    }

    fn fail(&mut self, e: Error) -> Error {
        error!("Error creating project: {e}");
        self.error = Some(format!("Failed to create project: {e}"));
        if let Error::AllSignaturesExhausted { failures } = &e {
            for failure in failures {
                self.debug_log
                    .push(format!("{} rejected: {}", failure.signature, failure.source));
            }
        }
        self.debug_log.push(format!("Error: {e:#?}"));
        e
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
