/// Role ability processors and their per-script dispatch tables.
///
/// Every processor is a pure function of the grimoire, the acting seat and
/// the invocation context. Processors never mutate state; they return the
/// intents (suggestions, status changes, deaths, chain reactions) that the
/// host applies.
pub mod demons;
pub mod helpers;
pub mod minions;
pub mod outsiders;
pub mod townsfolk;

use rustc_hash::FxHashMap;

pub use helpers::Grimoire;

use crate::schema::ability::{AbilityContext, AbilityError, AbilityResult};
use crate::schema::seat::SeatId;

pub type Processor = fn(&Grimoire<'_>, SeatId, &AbilityContext) -> AbilityResult;

/// Role id to processor.
pub type ProcessorTable = FxHashMap<&'static str, Processor>;

pub fn townsfolk_table() -> ProcessorTable {
    let mut table = ProcessorTable::default();
    table.insert("washerwoman", townsfolk::washerwoman as Processor);
    table.insert("librarian", townsfolk::librarian);
    table.insert("investigator", townsfolk::investigator);
    table.insert("chef", townsfolk::chef);
    table.insert("empath", townsfolk::empath);
    table.insert("fortune_teller", townsfolk::fortune_teller);
    table.insert("undertaker", townsfolk::undertaker);
    table.insert("monk", townsfolk::monk);
    table.insert("ravenkeeper", townsfolk::ravenkeeper);
    table.insert("virgin", townsfolk::virgin);
    table.insert("slayer", townsfolk::slayer);
    table.insert("soldier", townsfolk::soldier);
    table.insert("mayor", townsfolk::mayor);
    table
}

pub fn outsider_table() -> ProcessorTable {
    let mut table = ProcessorTable::default();
    table.insert("butler", outsiders::butler as Processor);
    table.insert("drunk", outsiders::drunk);
    table.insert("recluse", outsiders::recluse);
    table.insert("saint", outsiders::saint);
    table
}

pub fn minion_table() -> ProcessorTable {
    let mut table = ProcessorTable::default();
    table.insert("poisoner", minions::poisoner as Processor);
    table.insert("spy", minions::spy);
    table.insert("scarlet_woman", minions::scarlet_woman);
    table.insert("baron", minions::baron);
    table
}

pub fn demon_table() -> ProcessorTable {
    let mut table = ProcessorTable::default();
    table.insert("imp", demons::imp as Processor);
    table
}

/// The four team tables merged into one lookup.
pub fn trouble_brewing_table() -> ProcessorTable {
    let mut table = townsfolk_table();
    table.extend(outsider_table());
    table.extend(minion_table());
    table.extend(demon_table());
    table
}

/// Processor tables keyed by script id.
#[derive(Clone)]
pub struct ProcessorRegistry {
    tables: FxHashMap<String, ProcessorTable>,
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        let mut tables = FxHashMap::default();
        tables.insert("tb".to_string(), trouble_brewing_table());
        Self { tables }
    }
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the table for a script.
    pub fn register(&mut self, script_id: &str, table: ProcessorTable) {
        self.tables.insert(script_id.to_string(), table);
    }

    pub fn supports(&self, script_id: &str) -> bool {
        self.tables.contains_key(script_id)
    }

    pub fn table(&self, script_id: &str) -> Result<&ProcessorTable, AbilityError> {
        self.tables
            .get(script_id)
            .ok_or_else(|| AbilityError::UnsupportedScript(script_id.to_string()))
    }

    /// Whether `role_id` has a processor under `script_id`.
    pub fn has_processor(&self, script_id: &str, role_id: &str) -> bool {
        self.tables
            .get(script_id)
            .is_some_and(|t| t.contains_key(role_id))
    }

    /// Dispatch to the processor for `role_id` under the grimoire's script.
    pub fn process(
        &self,
        g: &Grimoire<'_>,
        seat_id: SeatId,
        role_id: &str,
        ctx: &AbilityContext,
    ) -> AbilityResult {
        let table = self.table(&g.state.current_script_id)?;
        let processor = table
            .get(role_id)
            .ok_or_else(|| AbilityError::UnknownRole(role_id.to_string()))?;
        processor(g, seat_id, ctx)
    }
}
