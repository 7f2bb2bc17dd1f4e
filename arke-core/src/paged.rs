//! The paged-list handler specialization: sorting by field name is driven by a static map
//! from field name to comparator, registered alongside the handler. Sorting by an
//! unregistered name is `invalid_parameters`.
use crate::response::ResponseCode;
use std::cmp::Ordering;
use std::collections::HashMap;

pub struct FieldSorters<Record> {
    sorters: HashMap<&'static str, fn(&Record, &Record) -> Ordering>,
}

impl<Record> FieldSorters<Record> {
    pub fn new() -> FieldSorters<Record> {
        FieldSorters {
            sorters: HashMap::new(),
        }
    }

    pub fn register(mut self, field: &'static str, cmp: fn(&Record, &Record) -> Ordering) -> Self {
        self.sorters.insert(field, cmp);
        self
    }

    fn get(&self, field: &str) -> Option<fn(&Record, &Record) -> Ordering> {
        self.sorters.get(field).copied()
    }
}

impl<Record> Default for FieldSorters<Record> {
    fn default() -> Self {
        FieldSorters::new()
    }
}

/// Sorts `source` by `order_by_field` (ascending or descending, stable), applies `skip`/`take`,
/// and binds each surviving record to a freshly constructed `Entry` via `bind`.
pub fn paged_list<Record, Entry>(
    mut source: Vec<Record>,
    skip: i32,
    take: i32,
    order_by_field: &str,
    order_by_ascending: bool,
    sorters: &FieldSorters<Record>,
    bind: impl Fn(&Record) -> Entry,
) -> Result<Vec<Entry>, ResponseCode> {
    let cmp = sorters.get(order_by_field).ok_or(ResponseCode::INVALID_PARAMETERS)?;

    source.sort_by(|a, b| {
        let ordering = cmp(a, b);
        if order_by_ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });

    let skip = skip.max(0) as usize;
    let take = take.max(0) as usize;

    Ok(source.iter().skip(skip).take(take).map(bind).collect())
}
