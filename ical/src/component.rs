// SPDX-FileCopyrightText: 2025-2026 Vesper contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Raw component tree.
//!
//! A [`Component`] keeps its properties as ordered, unfolded logical lines
//! rather than a typed model. Patching rewrites individual lines and leaves
//! everything else verbatim, which is what makes `update_vevent` safe for
//! alarms, attendees, and X- properties it knows nothing about.

use crate::error::IcalError;
use crate::line::{ContentLine, fold_line, unfold};

/// One iCalendar component (VCALENDAR, VEVENT, VALARM, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Component name as written in BEGIN, uppercased.
    pub name: String,
    /// Raw logical property lines in order of appearance.
    pub lines: Vec<String>,
    /// Nested components in order of appearance.
    pub children: Vec<Component>,
}

impl Component {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_uppercase(),
            lines: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Parses raw text into a component tree rooted at the first
    /// BEGIN:VCALENDAR.
    ///
    /// # Errors
    ///
    /// Returns an error for text without a VCALENDAR wrapper or with
    /// unbalanced BEGIN/END pairs.
    pub fn parse(raw: &str) -> Result<Self, IcalError> {
        let mut stack: Vec<Component> = Vec::new();

        for line in unfold(raw) {
            if let Some(name) = prefixed(&line, "BEGIN:") {
                stack.push(Self::new(name));
            } else if let Some(name) = prefixed(&line, "END:") {
                let done = stack
                    .pop()
                    .ok_or_else(|| IcalError::MismatchedEnd(name.to_string()))?;
                if !done.name.eq_ignore_ascii_case(name) {
                    return Err(IcalError::MismatchedEnd(name.to_string()));
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(done),
                    None if done.name == "VCALENDAR" => return Ok(done),
                    // Stray non-calendar root; keep scanning.
                    None => {}
                }
            } else if let Some(open) = stack.last_mut() {
                open.lines.push(line);
            }
            // Lines outside any component are ignored.
        }

        match stack.pop() {
            Some(open) => Err(IcalError::UnterminatedComponent(open.name)),
            None => Err(IcalError::NotACalendar),
        }
    }

    /// Serializes the tree back to folded text with CRLF line endings.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) {
        out.push_str("BEGIN:");
        out.push_str(&self.name);
        out.push_str("\r\n");
        for line in &self.lines {
            out.push_str(&fold_line(line));
            out.push_str("\r\n");
        }
        for child in &self.children {
            child.write(out);
        }
        out.push_str("END:");
        out.push_str(&self.name);
        out.push_str("\r\n");
    }

    /// First direct child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Component> {
        self.children
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Mutable access to the first direct child with the given name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.children
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// First property line with the given name, parsed.
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<ContentLine> {
        self.lines
            .iter()
            .filter_map(|l| ContentLine::parse(l).ok())
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Replaces the first property with the given name, or appends it.
    pub fn set_prop(&mut self, name: &str, raw_line: String) {
        match self.position(name) {
            Some(i) => self.lines[i] = raw_line,
            None => self.lines.push(raw_line),
        }
    }

    /// Removes every property with the given name.
    pub fn remove_prop(&mut self, name: &str) {
        self.lines.retain(|l| !has_name(l, name));
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.lines.iter().position(|l| has_name(l, name))
    }
}

fn prefixed<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = line.get(..prefix.len())?;
    rest.eq_ignore_ascii_case(prefix)
        .then(|| line[prefix.len()..].trim())
}

fn has_name(line: &str, name: &str) -> bool {
    let Some(head) = line.get(..name.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(name) && matches!(line.as_bytes().get(name.len()), Some(b':' | b';'))
}
