//! Plain-text tables for admin details and flag listings.

use checkpoint_core::AccessField;

use crate::models::{Admin, Flag, User};

/// A two-column table with a rule after every row.
///
/// ```text
/// +--------+-------+
/// | Detail | Value |
/// +--------+-------+
/// | Name   | Ada   |
/// +--------+-------+
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    header: (String, String),
    rows: Vec<(String, String)>,
}

impl Table {
    /// Create an empty table with the given column headers.
    #[must_use]
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            header: (left.into(), right.into()),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    #[must_use]
    pub fn row(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.rows.push((left.into(), right.into()));
        self
    }

    fn widths(&self) -> (usize, usize) {
        std::iter::once(&self.header)
            .chain(&self.rows)
            .fold((0, 0), |(l, r), (left, right)| {
                (l.max(left.chars().count()), r.max(right.chars().count()))
            })
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (lw, rw) = self.widths();
        let rule = format!("+-{}-+-{}-+", "-".repeat(lw), "-".repeat(rw));

        writeln!(f, "{rule}")?;
        for (left, right) in std::iter::once(&self.header).chain(&self.rows) {
            writeln!(f, "| {left:<lw$} | {right:<rw$} |")?;
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

const fn detail_label(field: AccessField) -> &'static str {
    match field {
        AccessField::Checkin => "Checkin Access",
        AccessField::Anticheat => "Anticheat Access",
        AccessField::QrManagement => "QR Management Access",
        AccessField::QuestionManagement => "Question Management Access",
        AccessField::Communication => "Communication Access",
    }
}

/// Heading and table describing one admin's permissions.
#[must_use]
pub fn admin_details(user: &User, admin: &Admin) -> String {
    let table = admin
        .access
        .iter()
        .fold(Table::new("Detail", "Value").row("Name", &user.name), |table, (field, value)| {
            table.row(detail_label(field), value.to_string())
        });

    format!("Details of the admin are as follows:\n{table}")
}

/// Table of every flag and its value.
#[must_use]
pub fn flags_table(flags: &[Flag]) -> String {
    flags
        .iter()
        .fold(Table::new("Flag", "Value"), |table, flag| {
            table.row(&flag.name, flag.value.to_string())
        })
        .to_string()
}
