//! Terminal wizard session: configure, fill, then export or edit.

use crate::prompt::Prompter;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use guiador_core::normalize::collapse_whitespace;
use guiador_core::wizard::MAX_SLOTS;
use guiador_core::{Catalog, Slot, WizardConfig, WizardState};
use guiador_pdf::PdfExporter;
use std::io::{BufRead, Write};
use std::path::Path;

const DEFAULT_HYMNS: usize = 4;
const DEFAULT_CHORUSES: usize = 2;

/// One user's pass through the wizard.
pub struct Session<'a, R, W> {
    catalog: &'a Catalog,
    exporter: &'a PdfExporter,
    output_dir: &'a Path,
    prompter: Prompter<R, W>,
    state: WizardState,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(
        catalog: &'a Catalog,
        exporter: &'a PdfExporter,
        output_dir: &'a Path,
        prompter: Prompter<R, W>,
    ) -> Self {
        Self {
            catalog,
            exporter,
            output_dir,
            prompter,
            state: WizardState::new(),
        }
    }

    /// Run the whole wizard. `now` stamps each generated document.
    pub fn run(&mut self, now: impl Fn() -> NaiveDateTime) -> Result<()> {
        self.prompter.say(guiador_core::document::DOCUMENT_TITLE)?;
        self.configure()?;
        self.fill()?;
        self.menu(now)
    }

    fn configure(&mut self) -> Result<()> {
        self.prompter.say("Paso 1: Configuración")?;

        let hymn_count = if self.prompter.ask_bool("¿Incluir Himnos?", true)? {
            self.prompter
                .ask_count("¿Cuántos himnos?", DEFAULT_HYMNS, 1, MAX_SLOTS)?
        } else {
            0
        };
        let chorus_count = if self.prompter.ask_bool("¿Incluir Coros?", true)? {
            self.prompter
                .ask_count("¿Cuántos coros?", DEFAULT_CHORUSES, 1, MAX_SLOTS)?
        } else {
            0
        };
        let tithe = self.prompter.ask_bool("¿Incluir Coro de Diezmo?", false)?;
        let final_chorus = self.prompter.ask_bool("¿Incluir Coro Final?", false)?;

        let config = WizardConfig::new(hymn_count, chorus_count)
            .with_tithe_chorus(tithe)
            .with_final_chorus(final_chorus);
        self.state
            .confirm(config)
            .context("Failed to confirm configuration")
    }

    fn fill(&mut self) -> Result<()> {
        self.prompter.say("Paso 2: Completar")?;
        for slot in self.state.slots() {
            self.fill_slot(slot)?;
        }
        self.fill_preacher()?;
        self.fill_notes()
    }

    fn fill_slot(&mut self, slot: Slot) -> Result<()> {
        let code = self
            .prompter
            .ask(&format!("{} (número)", slot))?
            .unwrap_or_default();
        let entry = self.state.set_code(self.catalog, slot, &code)?;
        self.prompter.say(&format!("  {}", entry.label()))
    }

    fn fill_preacher(&mut self) -> Result<()> {
        let name = self.prompter.ask("Predicador")?.unwrap_or_default();
        self.state.set_preacher(collapse_whitespace(&name))?;
        Ok(())
    }

    fn fill_notes(&mut self) -> Result<()> {
        let notes = self.prompter.ask_lines("Notas")?;
        self.state.set_notes(notes)?;
        Ok(())
    }

    fn menu(&mut self, now: impl Fn() -> NaiveDateTime) -> Result<()> {
        loop {
            let Some(choice) = self.prompter.ask(
                "[g] Generar PDF  [v] Vista previa  [j] JSON  [e] Editar  [s] Salir",
            )?
            else {
                return Ok(());
            };

            match choice.trim().to_lowercase().as_str() {
                "g" => self.generate(now())?,
                "v" => self.preview(now())?,
                "j" => self.print_json(now())?,
                "e" => self.edit()?,
                "s" | "q" => return Ok(()),
                "" => {}
                other => self.prompter.say(&format!("Opción desconocida: {}", other))?,
            }
        }
    }

    /// Export to the output directory. Render failures are reported and the
    /// session stays open so the user can retry.
    fn generate(&mut self, generated_at: NaiveDateTime) -> Result<()> {
        let document = self.state.assemble(generated_at)?;
        match self.exporter.export_to_dir(&document, self.output_dir) {
            Ok(path) => {
                log::info!("wrote {}", path.display());
                self.prompter
                    .say(&format!("PDF generado: {}", path.display()))
            }
            Err(e) => {
                log::error!("export failed: {}", e);
                self.prompter
                    .say(&format!("Error al generar el PDF: {}", e))
            }
        }
    }

    fn preview(&mut self, generated_at: NaiveDateTime) -> Result<()> {
        let document = self.state.assemble(generated_at)?;
        self.prompter.say(guiador_core::document::DOCUMENT_TITLE)?;
        self.prompter.say(&document.date_line())?;
        for section in document.sections() {
            self.prompter.say(section.heading())?;
            for line in &section.lines {
                self.prompter.say(&format!("  {}", line))?;
            }
        }
        Ok(())
    }

    fn print_json(&mut self, generated_at: NaiveDateTime) -> Result<()> {
        let document = self.state.assemble(generated_at)?;
        let json =
            serde_json::to_string_pretty(&document).context("Failed to serialize document")?;
        self.prompter.say(&json)
    }

    fn edit(&mut self) -> Result<()> {
        let slots = self.state.slots();
        for (i, slot) in slots.iter().enumerate() {
            let label = self
                .state
                .entry(*slot)
                .map(|e| format!("{} {}", e.code, e.label()))
                .unwrap_or_default();
            self.prompter.say(&format!("  {}. {}: {}", i + 1, slot, label))?;
        }
        self.prompter.say("  p. Predicador")?;
        self.prompter.say("  n. Notas")?;

        let Some(choice) = self.prompter.ask("¿Qué desea editar?")? else {
            return Ok(());
        };
        match choice.trim().to_lowercase().as_str() {
            "p" => self.fill_preacher(),
            "n" => self.fill_notes(),
            other => match other.parse::<usize>() {
                Ok(n) if (1..=slots.len()).contains(&n) => self.fill_slot(slots[n - 1]),
                _ => self.prompter.say("Posición no válida."),
            },
        }
    }

    #[cfg(test)]
    fn into_parts(self) -> (WizardState, W) {
        (self.state, self.prompter.into_output())
    }
}
