// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue message wire format and dead-letter metadata.

use serde::{Deserialize, Serialize};

use crate::job::{JobId, JobType, Payload};

crate::define_id! {
    /// Identifies a single enqueued message (independent of the job it carries).
    pub struct MessageId { prefix: "msg-" }
}

/// The body of a message sent to the job queue. Mirrors
/// `jobs.py::enqueue_job`'s message body: just enough to let a worker
/// re-derive everything else by reading the job document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub job_id: JobId,
    pub job_type: JobType,
    pub payload: Payload,
}

impl Message {
    pub fn new(job_id: JobId, job_type: JobType, payload: Payload) -> Self {
        Self {
            message_id: MessageId::new(),
            job_id,
            job_type,
            payload,
        }
    }
}

/// Structured reason a message landed in the dead-letter queue, extracted
/// from a broker delivery's application properties. Mirrors
/// `worker.py::_extract_dead_letter_details`'s byte-vs-string fallback:
/// some brokers surface these as raw bytes, others as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterDetails {
    pub reason: Option<String>,
    pub error_description: Option<String>,
}

impl DeadLetterDetails {
    /// Parse dead-letter application properties, accepting either UTF-8
    /// bytes or already-decoded strings for each field (some broker clients
    /// hand back `Vec<u8>`, others `String`).
    pub fn from_properties(
        reason: Option<DeadLetterValue>,
        error_description: Option<DeadLetterValue>,
    ) -> Self {
        Self {
            reason: reason.and_then(DeadLetterValue::into_string),
            error_description: error_description.and_then(DeadLetterValue::into_string),
        }
    }
}

/// Either form a broker might hand back for a dead-letter application
/// property.
#[derive(Debug, Clone, PartialEq)]
pub enum DeadLetterValue {
    Bytes(Vec<u8>),
    Text(String),
}

impl DeadLetterValue {
    fn into_string(self) -> Option<String> {
        match self {
            DeadLetterValue::Bytes(b) => String::from_utf8(b).ok(),
            DeadLetterValue::Text(s) => Some(s),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
