use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::{InstallRequestBuilder, InstallerConfig, parse_terminal, suggest_app_id, suggest_app_name};
use crate::registrar::{InstalledApp, Installer};

#[derive(Debug)]
pub enum SessionOutcome {
    Installed(InstalledApp),
    Cancelled,
}

enum Step {
    Continue,
    Done(SessionOutcome),
}

/// Numbered-menu front-end. Fields are edited one at a time until the
/// operator installs or cancels; end of input counts as cancel.
pub struct Session<R, W> {
    input: R,
    output: W,
    config: InstallerConfig,
    form: InstallRequestBuilder,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W, config: InstallerConfig) -> Self {
        Session {
            input,
            output,
            config,
            form: InstallRequestBuilder::default(),
        }
    }

    pub fn run(mut self) -> io::Result<SessionOutcome> {
        loop {
            self.print_menu()?;

            let Some(choice) = self.prompt("Select an option")? else {
                return Ok(SessionOutcome::Cancelled);
            };

            if let Step::Done(outcome) = self.handle(choice.trim())? {
                return Ok(outcome);
            }
        }
    }

    fn handle(&mut self, choice: &str) -> io::Result<Step> {
        debug!("Menu choice: {:?}", choice);

        match choice {
            "1" => self.edit_text("App ID", |form, v| form.app_id = v),
            "2" => self.edit_text("App name", |form, v| form.app_name = v),
            "3" => self.edit_executable(),
            "4" => self.edit_additional_file(),
            "5" => self.edit_path("Additional files directory", |form, v| form.additional_files_dir = v),
            "6" => self.edit_path("Icon", |form, v| form.icon = v),
            "7" => self.edit_text("Comment", |form, v| form.comment = v),
            "8" => self.edit_text("Generic name", |form, v| form.generic_name = v),
            "9" => self.edit_list("Categories (separated by ';')", |form, v| form.categories = v),
            "10" => self.edit_list("Keywords (separated by ';')", |form, v| form.keywords = v),
            "11" => self.edit_terminal(),
            "12" => self.edit_setting("Packages root", |config, v| config.packages_root = v),
            "13" => self.edit_setting("Desktop entries directory", |config, v| config.desktop_entries_dir = v),
            "i" | "I" => self.install(),
            "q" | "Q" => {
                writeln!(self.output, "Installation cancelled.")?;
                Ok(Step::Done(SessionOutcome::Cancelled))
            }
            "" => Ok(Step::Continue),
            other => {
                writeln!(self.output, "Unknown option: {}", other)?;
                Ok(Step::Continue)
            }
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        let form = &self.form;
        let out = &mut self.output;

        writeln!(out)?;
        writeln!(out, "── Install application ──")?;
        writeln!(out, " 1) App ID                     : {}", show(&form.app_id))?;
        writeln!(out, " 2) App name                   : {}", show(&form.app_name))?;
        writeln!(out, " 3) Executable                 : {}", show_path(form.executable.as_deref()))?;
        writeln!(out, " 4) Additional files           : {}", show_paths(&form.additional_files))?;
        writeln!(out, " 5) Additional files directory : {}", show_path(form.additional_files_dir.as_deref()))?;
        writeln!(out, " 6) Icon                       : {}", show_path(form.icon.as_deref()))?;
        writeln!(out, " 7) Comment                    : {}", show(&form.comment))?;
        writeln!(out, " 8) Generic name               : {}", show(&form.generic_name))?;
        writeln!(out, " 9) Categories                 : {}", form.categories.join(";"))?;
        writeln!(out, "10) Keywords                   : {}", form.keywords.join(";"))?;
        writeln!(
            out,
            "11) Terminal                   : {}",
            match form.terminal {
                Some(true) => "true",
                Some(false) => "false",
                None => "",
            }
        )?;
        writeln!(out, "12) Packages root              : {}", self.config.packages_root.display())?;
        writeln!(out, "13) Desktop entries directory  : {}", self.config.desktop_entries_dir.display())?;
        writeln!(out, " i) Install")?;
        writeln!(out, " q) Cancel")?;
        Ok(())
    }

    /// Reads one line. `None` means the input is exhausted.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\n', '\r']);
        Ok(Some(trimmed.to_string()))
    }

    fn read_value(&mut self, label: &str) -> io::Result<Option<Option<String>>> {
        Ok(self
            .prompt(&format!("{} (empty to clear)", label))?
            .map(|v| if v.trim().is_empty() { None } else { Some(v) }))
    }

    fn edit_text<F>(&mut self, label: &str, apply: F) -> io::Result<Step>
    where
        F: FnOnce(&mut InstallRequestBuilder, Option<String>),
    {
        match self.read_value(label)? {
            Some(value) => {
                apply(&mut self.form, value);
                Ok(Step::Continue)
            }
            None => Ok(Step::Done(SessionOutcome::Cancelled)),
        }
    }

    fn edit_path<F>(&mut self, label: &str, apply: F) -> io::Result<Step>
    where
        F: FnOnce(&mut InstallRequestBuilder, Option<PathBuf>),
    {
        self.edit_text(label, |form, v| apply(form, v.map(PathBuf::from)))
    }

    fn edit_list<F>(&mut self, label: &str, apply: F) -> io::Result<Step>
    where
        F: FnOnce(&mut InstallRequestBuilder, Vec<String>),
    {
        self.edit_text(label, |form, v| {
            let items = v
                .map(|v| {
                    v.split(';')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            apply(form, items)
        })
    }

    fn edit_executable(&mut self) -> io::Result<Step> {
        let Some(value) = self.read_value("Executable")? else {
            return Ok(Step::Done(SessionOutcome::Cancelled));
        };
        self.form.executable = value.map(PathBuf::from);

        let suggestion = self
            .form
            .executable
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| suggest_app_id(&name.to_string_lossy()))
            .filter(|id| !id.is_empty());

        if let Some(app_id) = suggestion
            && self.form.app_id.is_none()
        {
            writeln!(self.output, "Suggested app id: {}", app_id)?;
            if self.form.app_name.is_none() {
                self.form.app_name = Some(suggest_app_name(&app_id));
            }
            self.form.app_id = Some(app_id);
        }

        Ok(Step::Continue)
    }

    fn edit_additional_file(&mut self) -> io::Result<Step> {
        let Some(value) = self.read_value("Add additional file")? else {
            return Ok(Step::Done(SessionOutcome::Cancelled));
        };
        match value {
            Some(path) => self.form.additional_files.push(PathBuf::from(path)),
            None => self.form.additional_files.clear(),
        }
        Ok(Step::Continue)
    }

    fn edit_terminal(&mut self) -> io::Result<Step> {
        let Some(value) = self.read_value("Terminal (true/false/1/0)")? else {
            return Ok(Step::Done(SessionOutcome::Cancelled));
        };
        match value.as_deref().map(parse_terminal) {
            None => self.form.terminal = None,
            Some(Ok(terminal)) => self.form.terminal = Some(terminal),
            Some(Err(message)) => writeln!(self.output, "❌ {}", message)?,
        }
        Ok(Step::Continue)
    }

    fn edit_setting<F>(&mut self, label: &str, apply: F) -> io::Result<Step>
    where
        F: FnOnce(&mut InstallerConfig, PathBuf),
    {
        let Some(value) = self.prompt(&format!("{} (empty to keep)", label))? else {
            return Ok(Step::Done(SessionOutcome::Cancelled));
        };
        if !value.trim().is_empty() {
            apply(&mut self.config, PathBuf::from(value));
        }
        Ok(Step::Continue)
    }

    fn install(&mut self) -> io::Result<Step> {
        let request = match self.form.build() {
            Ok(request) => request,
            Err(e) => {
                writeln!(self.output, "❌ {}", e)?;
                return Ok(Step::Continue);
            }
        };

        match Installer::new(self.config.clone()).install(&request) {
            Ok(installed) => {
                writeln!(
                    self.output,
                    "✅ Installed {} into {}",
                    installed.app_id,
                    installed.app_dir.display()
                )?;
                Ok(Step::Done(SessionOutcome::Installed(installed)))
            }
            Err(e) => {
                writeln!(self.output, "❌ {}", e)?;
                Ok(Step::Continue)
            }
        }
    }
}

fn show(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn show_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

fn show_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
