/*
Copyright 2024, Zep Software, Inc.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/


//! In-memory table with CSV I/O
//!
//! Row identity is the row's position in the source file. Stages append
//! derived columns; cells loaded from the source are left as they were.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::errors::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table, rejecting rows whose width differs from the header
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> PipelineResult<Self> {
        for (index, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(PipelineError::RaggedRow {
                    row: index,
                    found: row.len(),
                    expected: headers.len(),
                });
            }
        }
        Ok(Self { headers, rows })
    }

    pub fn read_csv(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        debug!(
            "Loaded {} rows x {} columns from {}",
            table.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse CSV with a header row; short rows are padded with empty cells
    pub fn from_reader<R: Read>(reader: R) -> PipelineResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() > headers.len() {
                return Err(PipelineError::RaggedRow {
                    row: index,
                    found: record.len(),
                    expected: headers.len(),
                });
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Write the table as CSV. The file is written next to its destination and
    /// renamed into place, so an interrupted write never leaves a torn file.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> PipelineResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut staging = path.as_os_str().to_owned();
        staging.push(".partial");
        let staging = std::path::PathBuf::from(staging);

        {
            let file = fs::File::create(&staging)?;
            self.to_writer(file)?;
        }
        fs::rename(&staging, path)?;
        debug!("Wrote {} rows to {}", self.len(), path.display());
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> PipelineResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// First of `candidates` present in the header
    pub fn first_present_column<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|c| self.has_column(c))
    }

    pub fn require_column(&self, name: &str) -> PipelineResult<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }

    /// All values of a named column in row order
    pub fn column_values(&self, name: &str) -> PipelineResult<Vec<&str>> {
        let index = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| r[index].as_str()).collect())
    }

    /// Index of `name`, appending an empty column when absent
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value.into();
        }
    }

    /// New table holding the rows for which `keep` is true, in order
    pub fn filter_rows(&self, mut keep: impl FnMut(&[String]) -> bool) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}
