//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! Module with the build log: the accumulator every pipeline stage reports into.
//!
//! Parsing and binding problems are data, not control flow: they land here as [`BuildMessage`]s
//! with a [`SourceLocation`] and the build keeps going until the next gate, so one broken cell
//! doesn't hide the other twenty broken cells behind it.

use getset::Getters;
use serde_derive::{Deserialize, Serialize};

use std::fmt;
use std::fmt::Display;

use crate::sheets::location::SourceLocation;

//---------------------------------------------------------------------------//
//                              Enum & Structs
//---------------------------------------------------------------------------//

/// Severity of a build message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// One diagnostic produced during a build.
#[derive(Clone, Debug, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct BuildMessage {

    /// Severity of this message.
    level: MessageLevel,

    /// Human-readable text of the message.
    text: String,

    /// Location in the source sheet, when one is known.
    location: Option<SourceLocation>,

    /// Nested cause, for messages that wrap a lower-level one.
    cause: Option<Box<BuildMessage>>,
}

/// The chronological list of messages accumulated during a build.
#[derive(Clone, Debug, Default, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct BuildLog {
    messages: Vec<BuildMessage>,
}

/// The final report of a build, printable and embeddable into the archive's `_metadata`.
#[derive(Clone, Debug, Default, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct BuildReport {
    messages: Vec<BuildMessage>,
    num_warnings: usize,
    num_errors: usize,
}

//---------------------------------------------------------------------------//
//                              Implementations
//---------------------------------------------------------------------------//

impl BuildMessage {

    /// This function builds a new message of the provided severity.
    pub fn new(level: MessageLevel, text: &str, location: Option<SourceLocation>) -> Self {
        Self { level, text: text.to_owned(), location, cause: None }
    }

    /// This function builds an info message.
    pub fn info(text: &str, location: Option<SourceLocation>) -> Self {
        Self::new(MessageLevel::Info, text, location)
    }

    /// This function builds a warning message.
    pub fn warning(text: &str, location: Option<SourceLocation>) -> Self {
        Self::new(MessageLevel::Warning, text, location)
    }

    /// This function builds an error message.
    pub fn error(text: &str, location: Option<SourceLocation>) -> Self {
        Self::new(MessageLevel::Error, text, location)
    }

    /// This function wraps another message as the cause of this one.
    pub fn with_cause(mut self, cause: BuildMessage) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl Display for BuildMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level = match self.level {
            MessageLevel::Info => "Info",
            MessageLevel::Warning => "Warning",
            MessageLevel::Error => "Error",
        };
        match &self.location {
            Some(location) => write!(f, "[{level}] {} ({location})", self.text)?,
            None => write!(f, "[{level}] {}", self.text)?,
        }
        if let Some(cause) = &self.cause {
            write!(f, "\n    Caused by: {cause}")?;
        }
        Ok(())
    }
}

impl BuildLog {

    /// This function creates a new empty build log.
    pub fn new() -> Self {
        Self::default()
    }

    /// This function appends a message to the log.
    pub fn push(&mut self, message: BuildMessage) {
        self.messages.push(message);
    }

    /// This function appends an info message to the log.
    pub fn info(&mut self, text: &str, location: Option<SourceLocation>) {
        self.push(BuildMessage::info(text, location));
    }

    /// This function appends a warning message to the log.
    pub fn warning(&mut self, text: &str, location: Option<SourceLocation>) {
        self.push(BuildMessage::warning(text, location));
    }

    /// This function appends an error message to the log.
    pub fn error(&mut self, text: &str, location: Option<SourceLocation>) {
        self.push(BuildMessage::error(text, location));
    }

    /// This function moves all messages of another log into this one, preserving order.
    pub fn append(&mut self, other: &mut BuildLog) {
        self.messages.append(&mut other.messages);
    }

    /// This function returns true if the log contains at least one error.
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|message| *message.level() == MessageLevel::Error)
    }

    /// This function turns the log into its final report.
    pub fn into_report(self) -> BuildReport {
        let num_warnings = self.messages.iter().filter(|message| *message.level() == MessageLevel::Warning).count();
        let num_errors = self.messages.iter().filter(|message| *message.level() == MessageLevel::Error).count();
        BuildReport { messages: self.messages, num_warnings, num_errors }
    }
}

impl BuildReport {

    /// This function returns true if the report contains at least one error.
    pub fn has_errors(&self) -> bool {
        self.num_errors > 0
    }
}

impl Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for message in &self.messages {
            writeln!(f, "{message}")?;
        }
        write!(f, "{} errors, {} warnings.", self.num_errors, self.num_warnings)
    }
}
