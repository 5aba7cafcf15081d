//! Per-session wizard state: configure the service, then fill in the slots.

use crate::document::ServiceDocument;
use crate::lookup::Catalog;
use crate::types::{Code, SlotEntry};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on hymn and chorus slots.
pub const MAX_SLOTS: usize = 10;

/// Wizard phase. The only transition is `Configuring -> Filling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Configuring,
    Filling,
}

/// Address of one user-entry position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Zero-based hymn slot.
    Hymn(usize),
    /// Zero-based chorus slot.
    Chorus(usize),
    TitheChorus,
    FinalChorus,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Hymn(i) => write!(f, "Himno {}", i + 1),
            Slot::Chorus(i) => write!(f, "Coro {}", i + 1),
            Slot::TitheChorus => f.write_str("Coro de diezmo"),
            Slot::FinalChorus => f.write_str("Coro final"),
        }
    }
}

/// Shape of the service, chosen in the first phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardConfig {
    pub hymn_count: usize,
    pub chorus_count: usize,
    pub include_tithe_chorus: bool,
    pub include_final_chorus: bool,
}

impl WizardConfig {
    /// Create a configuration with the given slot counts and no extra choruses.
    pub fn new(hymn_count: usize, chorus_count: usize) -> Self {
        Self {
            hymn_count,
            chorus_count,
            include_tithe_chorus: false,
            include_final_chorus: false,
        }
    }

    /// Set whether the tithe chorus slot is included.
    pub fn with_tithe_chorus(mut self, include: bool) -> Self {
        self.include_tithe_chorus = include;
        self
    }

    /// Set whether the final chorus slot is included.
    pub fn with_final_chorus(mut self, include: bool) -> Self {
        self.include_final_chorus = include;
        self
    }

    /// Check the slot counts are within `0..=MAX_SLOTS`.
    pub fn validate(&self) -> Result<()> {
        if self.hymn_count > MAX_SLOTS {
            return Err(Error::InvalidConfig(format!(
                "at most {} hymns, got {}",
                MAX_SLOTS, self.hymn_count
            )));
        }
        if self.chorus_count > MAX_SLOTS {
            return Err(Error::InvalidConfig(format!(
                "at most {} choruses, got {}",
                MAX_SLOTS, self.chorus_count
            )));
        }
        Ok(())
    }
}

/// Everything one user has entered so far.
#[derive(Debug, Clone)]
pub struct WizardState {
    phase: Phase,
    config: WizardConfig,
    hymns: Vec<SlotEntry>,
    choruses: Vec<SlotEntry>,
    tithe_chorus: Option<SlotEntry>,
    final_chorus: Option<SlotEntry>,
    preacher: String,
    notes: String,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    /// Fresh session in the `Configuring` phase.
    pub fn new() -> Self {
        Self {
            phase: Phase::Configuring,
            config: WizardConfig::default(),
            hymns: Vec::new(),
            choruses: Vec::new(),
            tithe_chorus: None,
            final_chorus: None,
            preacher: String::new(),
            notes: String::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Confirmed configuration (all zero while configuring).
    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    /// Capture the configuration, allocate blank slots and move to `Filling`.
    pub fn confirm(&mut self, config: WizardConfig) -> Result<()> {
        if self.phase != Phase::Configuring {
            return Err(Error::InvalidTransition(self.phase));
        }
        config.validate()?;

        self.hymns = vec![SlotEntry::empty(); config.hymn_count];
        self.choruses = vec![SlotEntry::empty(); config.chorus_count];
        self.tithe_chorus = config.include_tithe_chorus.then(SlotEntry::empty);
        self.final_chorus = config.include_final_chorus.then(SlotEntry::empty);
        self.config = config;
        self.phase = Phase::Filling;

        log::debug!("wizard confirmed: {:?}", config);
        Ok(())
    }

    /// Allocated slots in form order.
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots: Vec<Slot> = (0..self.hymns.len()).map(Slot::Hymn).collect();
        slots.extend((0..self.choruses.len()).map(Slot::Chorus));
        if self.tithe_chorus.is_some() {
            slots.push(Slot::TitheChorus);
        }
        if self.final_chorus.is_some() {
            slots.push(Slot::FinalChorus);
        }
        slots
    }

    /// Entry of an allocated slot.
    pub fn entry(&self, slot: Slot) -> Option<&SlotEntry> {
        match slot {
            Slot::Hymn(i) => self.hymns.get(i),
            Slot::Chorus(i) => self.choruses.get(i),
            Slot::TitheChorus => self.tithe_chorus.as_ref(),
            Slot::FinalChorus => self.final_chorus.as_ref(),
        }
    }

    fn entry_mut(&mut self, slot: Slot) -> Option<&mut SlotEntry> {
        match slot {
            Slot::Hymn(i) => self.hymns.get_mut(i),
            Slot::Chorus(i) => self.choruses.get_mut(i),
            Slot::TitheChorus => self.tithe_chorus.as_mut(),
            Slot::FinalChorus => self.final_chorus.as_mut(),
        }
    }

    fn require_filling(&self) -> Result<()> {
        if self.phase == Phase::Filling {
            Ok(())
        } else {
            Err(Error::InvalidTransition(self.phase))
        }
    }

    /// Set a slot's code and re-resolve its title.
    ///
    /// A code that does not resolve is kept; it simply shows the placeholder
    /// and stays out of the exported sheet.
    pub fn set_code(&mut self, catalog: &Catalog, slot: Slot, code: &str) -> Result<&SlotEntry> {
        self.require_filling()?;

        let code = Code::new(code);
        let lookup = catalog.resolve(slot, &code);
        let entry = self.entry_mut(slot).ok_or(Error::UnknownSlot(slot))?;
        *entry = SlotEntry::new(code, lookup);
        Ok(&*entry)
    }

    /// Preacher name.
    pub fn preacher(&self) -> &str {
        &self.preacher
    }

    /// Set the preacher name.
    pub fn set_preacher(&mut self, name: impl Into<String>) -> Result<()> {
        self.require_filling()?;
        self.preacher = name.into();
        Ok(())
    }

    /// Notes for the service leader.
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Set the notes.
    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<()> {
        self.require_filling()?;
        self.notes = notes.into();
        Ok(())
    }

    /// Snapshot the session into a document for export.
    pub fn assemble(&self, generated_at: NaiveDateTime) -> Result<ServiceDocument> {
        self.require_filling()?;

        Ok(ServiceDocument {
            hymns: self.hymns.clone(),
            choruses: self.choruses.clone(),
            tithe_chorus: self.tithe_chorus.clone().unwrap_or_default(),
            final_chorus: self.final_chorus.clone().unwrap_or_default(),
            preacher: self.preacher.clone(),
            notes: self.notes.clone(),
            generated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::tests::sample_catalog;
    use crate::lookup::{Lookup, Miss};

    fn filling(config: WizardConfig) -> WizardState {
        let mut state = WizardState::new();
        state.confirm(config).unwrap();
        state
    }

    #[test]
    fn test_starts_configuring() {
        let state = WizardState::new();
        assert_eq!(state.phase(), Phase::Configuring);
        assert!(state.slots().is_empty());
    }

    #[test]
    fn test_confirm_allocates_slots() {
        let state = filling(WizardConfig::new(2, 1).with_final_chorus(true));
        assert_eq!(state.phase(), Phase::Filling);
        assert_eq!(
            state.slots(),
            vec![Slot::Hymn(0), Slot::Hymn(1), Slot::Chorus(0), Slot::FinalChorus]
        );
        assert_eq!(state.entry(Slot::Hymn(1)), Some(&SlotEntry::empty()));
        assert_eq!(state.entry(Slot::TitheChorus), None);
    }

    #[test]
    fn test_confirm_is_irreversible() {
        let mut state = filling(WizardConfig::new(1, 1));
        let err = state.confirm(WizardConfig::new(3, 3)).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(Phase::Filling)));
        assert_eq!(state.config().hymn_count, 1);
    }

    #[test]
    fn test_confirm_rejects_large_counts() {
        let mut state = WizardState::new();
        assert!(matches!(
            state.confirm(WizardConfig::new(11, 0)),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            state.confirm(WizardConfig::new(0, 11)),
            Err(Error::InvalidConfig(_))
        ));
        assert_eq!(state.phase(), Phase::Configuring);
        state.confirm(WizardConfig::new(10, 10)).unwrap();
    }

    #[test]
    fn test_edits_require_filling() {
        let catalog = sample_catalog();
        let mut state = WizardState::new();
        assert!(state.set_code(&catalog, Slot::Hymn(0), "101").is_err());
        assert!(state.set_preacher("Juan").is_err());
        assert!(state.set_notes("x").is_err());
        assert!(state.assemble(NaiveDateTime::default()).is_err());
    }

    #[test]
    fn test_set_code_resolves() {
        let catalog = sample_catalog();
        let mut state = filling(WizardConfig::new(1, 0).with_tithe_chorus(true));

        let entry = state.set_code(&catalog, Slot::Hymn(0), " 101 ").unwrap();
        assert_eq!(entry.code.as_str(), "101");
        assert_eq!(entry.lookup, Lookup::Found("Amor de Dios".into()));

        let entry = state.set_code(&catalog, Slot::TitheChorus, "205").unwrap();
        assert_eq!(entry.title(), Some("Gracia Sublime"));

        let entry = state.set_code(&catalog, Slot::Hymn(0), "999").unwrap();
        assert_eq!(entry.lookup, Lookup::NotFound(Miss::Absent));
        assert_eq!(state.entry(Slot::Hymn(0)).unwrap().code.as_str(), "999");
    }

    #[test]
    fn test_set_code_unknown_slot() {
        let catalog = sample_catalog();
        let mut state = filling(WizardConfig::new(1, 0));
        assert!(matches!(
            state.set_code(&catalog, Slot::Hymn(1), "101"),
            Err(Error::UnknownSlot(Slot::Hymn(1)))
        ));
        assert!(matches!(
            state.set_code(&catalog, Slot::FinalChorus, "7"),
            Err(Error::UnknownSlot(Slot::FinalChorus))
        ));
    }

    #[test]
    fn test_duplicate_codes_allowed() {
        let catalog = sample_catalog();
        let mut state = filling(WizardConfig::new(2, 0));
        state.set_code(&catalog, Slot::Hymn(0), "101").unwrap();
        state.set_code(&catalog, Slot::Hymn(1), "101").unwrap();
        assert_eq!(state.entry(Slot::Hymn(0)), state.entry(Slot::Hymn(1)));
    }

    #[test]
    fn test_assemble_snapshot() {
        let catalog = sample_catalog();
        let mut state = filling(WizardConfig::new(1, 0));
        state.set_code(&catalog, Slot::Hymn(0), "101").unwrap();
        state.set_preacher("Hno. Pedro").unwrap();
        state.set_notes("Santa cena").unwrap();

        let doc = state.assemble(NaiveDateTime::default()).unwrap();
        assert_eq!(doc.hymns.len(), 1);
        assert_eq!(doc.preacher, "Hno. Pedro");
        assert_eq!(doc.notes, "Santa cena");
        assert_eq!(doc.tithe_chorus, SlotEntry::empty());
    }

    #[test]
    fn test_slot_display() {
        assert_eq!(Slot::Hymn(0).to_string(), "Himno 1");
        assert_eq!(Slot::Chorus(2).to_string(), "Coro 3");
        assert_eq!(Slot::TitheChorus.to_string(), "Coro de diezmo");
    }
}
