//! Composable row filters over the unified ridership table.
//!
//! Filters only narrow a [`Mask`]; the table itself is never modified.
//! [`ApcDataProcessor::process`] materializes the selected rows.

mod mask;

pub use mask::Mask;

use std::collections::HashSet;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::errors::{FilterError, ProcessorError};
use crate::loader::{EVENT_TIMESTAMP, VEHICLE_ID};
use crate::table::{Table, Value};

/// Holds the unified table and the current selection over it.
#[derive(Debug)]
pub struct ApcDataProcessor {
    table: Table,
    mask: Mask,
}

impl ApcDataProcessor {
    pub fn new(table: Table) -> Self {
        let mask = Mask::all(table.len());
        Self { table, mask }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Intersects an arbitrary mask into the current selection.
    pub fn add_filter(&mut self, mask: Mask) -> Result<&mut Self, FilterError> {
        self.mask.and(&mask)?;
        Ok(self)
    }

    /// Resets the selection to every row.
    pub fn clear_filters(&mut self) {
        self.mask = Mask::all(self.table.len());
    }

    /// Keeps rows whose `event_timestamp` lies in `[start, end]`.
    ///
    /// Rows with a null timestamp are dropped.
    pub fn filter_by_date_and_time(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<&mut Self, ProcessorError> {
        let mask = self.column_mask(EVENT_TIMESTAMP, "timestamp", |value| match value {
            Value::Timestamp(ts) => Some(start <= *ts && *ts <= end),
            _ => None,
        })?;
        self.add_filter(mask)?;
        debug!(%start, %end, selected = self.mask.selected(), "Date filter applied");
        Ok(self)
    }

    /// Keeps rows whose `vehicle_id` is in `vehicle_ids`.
    ///
    /// An absent or empty set leaves the selection unchanged.
    pub fn filter_by_vehicle(
        &mut self,
        vehicle_ids: Option<&HashSet<i64>>,
    ) -> Result<&mut Self, ProcessorError> {
        if !self.table.has_column(VEHICLE_ID) {
            return Err(FilterError::MissingColumn(VEHICLE_ID.to_string()).into());
        }
        let Some(ids) = vehicle_ids.filter(|ids| !ids.is_empty()) else {
            return Ok(self);
        };

        let mask = self.column_mask(VEHICLE_ID, "integer", |value| match value {
            Value::Integer(id) => Some(ids.contains(id)),
            _ => None,
        })?;
        self.add_filter(mask)?;
        debug!(vehicles = ids.len(), selected = self.mask.selected(), "Vehicle filter applied");
        Ok(self)
    }

    /// Returns the selected rows in their original order.
    pub fn apply_filters(&self) -> Result<Table, FilterError> {
        if self.mask.len() != self.table.len() {
            return Err(FilterError::LengthMismatch {
                expected: self.table.len(),
                found: self.mask.len(),
            });
        }
        Ok(self.table.select(self.mask.as_slice()))
    }

    pub fn process(&self) -> Result<Table, ProcessorError> {
        Ok(self.apply_filters()?)
    }

    /// Builds a mask from one column. Nulls are never selected; `predicate`
    /// returns `None` for a value of the wrong type.
    fn column_mask<F>(
        &self,
        column: &str,
        expected: &'static str,
        predicate: F,
    ) -> Result<Mask, FilterError>
    where
        F: Fn(&Value) -> Option<bool>,
    {
        let cells = self
            .table
            .column(column)
            .ok_or_else(|| FilterError::MissingColumn(column.to_string()))?;

        cells
            .map(|value| {
                if value.is_null() {
                    return Ok(false);
                }
                predicate(value).ok_or_else(|| FilterError::TypeMismatch {
                    column: column.to_string(),
                    expected,
                    found: value.type_name(),
                })
            })
            .collect::<Result<Vec<bool>, _>>()
            .map(Mask::from)
    }
}
