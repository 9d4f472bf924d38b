//! The record threaded through the pipeline.
//!
//! A [`Record`] is field-sparse: every field is optional, and absence is a
//! legal state at every point of a run. Steps receive the accumulated record
//! by reference and return a sparse `Record` holding only the fields they
//! write; the runner folds that patch back in with [`Record::merge`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::weather::WeatherReport;

// ── Fields ──────────────────────────────────────────────────────────

/// Names of the record's fields, used by steps to declare what they read
/// and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    City,
    Question,
    Weather,
    WeatherText,
    Answer,
    SendEmailFlag,
    SendWhatsappFlag,
}

impl Field {
    /// Fields a driver supplies before the first step runs.
    pub const INPUTS: &'static [Field] = &[
        Field::City,
        Field::Question,
        Field::SendEmailFlag,
        Field::SendWhatsappFlag,
    ];

    /// Every field, in declaration order.
    pub const ALL: &'static [Field] = &[
        Field::City,
        Field::Question,
        Field::Weather,
        Field::WeatherText,
        Field::Answer,
        Field::SendEmailFlag,
        Field::SendWhatsappFlag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Question => "question",
            Self::Weather => "weather",
            Self::WeatherText => "weather_text",
            Self::Answer => "answer",
            Self::SendEmailFlag => "send_email_flag",
            Self::SendWhatsappFlag => "send_whatsapp_flag",
        }
    }

    pub fn is_input(&self) -> bool {
        Self::INPUTS.contains(self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Record ──────────────────────────────────────────────────────────

/// Shared state for one pipeline run.
///
/// Also used as the sparse patch a step returns. No validation happens here;
/// a record with every field `None` is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// City name as typed by the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// The user's natural-language question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Normalized lookup result, or `NoData` when the lookup found nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReport>,
    /// Human-readable summary derived from `weather`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_text: Option<String>,
    /// The composed answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Deliver the answer by email. Controls side effects only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_email_flag: Option<bool>,
    /// Deliver the answer over WhatsApp/SMS. Controls side effects only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_whatsapp_flag: Option<bool>,
}

impl Record {
    /// An empty record (equivalently, an empty patch).
    pub fn new() -> Self {
        Self::default()
    }

    /// The initial record a driver builds for one request.
    pub fn request(
        city: impl Into<String>,
        question: impl Into<String>,
        send_email: bool,
        send_whatsapp: bool,
    ) -> Self {
        Self {
            city: Some(city.into()),
            question: Some(question.into()),
            send_email_flag: Some(send_email),
            send_whatsapp_flag: Some(send_whatsapp),
            ..Self::default()
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn with_weather(mut self, weather: WeatherReport) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_weather_text(mut self, text: impl Into<String>) -> Self {
        self.weather_text = Some(text.into());
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    pub fn with_send_email(mut self, flag: bool) -> Self {
        self.send_email_flag = Some(flag);
        self
    }

    pub fn with_send_whatsapp(mut self, flag: bool) -> Self {
        self.send_whatsapp_flag = Some(flag);
        self
    }

    /// Whether `field` holds a value.
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::City => self.city.is_some(),
            Field::Question => self.question.is_some(),
            Field::Weather => self.weather.is_some(),
            Field::WeatherText => self.weather_text.is_some(),
            Field::Answer => self.answer.is_some(),
            Field::SendEmailFlag => self.send_email_flag.is_some(),
            Field::SendWhatsappFlag => self.send_whatsapp_flag.is_some(),
        }
    }

    /// Fields that hold a value, in declaration order.
    pub fn present_fields(&self) -> Vec<Field> {
        let fields = Field::ALL.iter().copied();
        fields.filter(|f| self.has(*f)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }

    /// Apply a sparse patch: fields present in `patch` replace the current
    /// value, absent fields are left unchanged.
    pub fn merge(&mut self, patch: Record) {
        let Record {
            city,
            question,
            weather,
            weather_text,
            answer,
            send_email_flag,
            send_whatsapp_flag,
        } = patch;

        if city.is_some() {
            self.city = city;
        }
        if question.is_some() {
            self.question = question;
        }
        if weather.is_some() {
            self.weather = weather;
        }
        if weather_text.is_some() {
            self.weather_text = weather_text;
        }
        if answer.is_some() {
            self.answer = answer;
        }
        if send_email_flag.is_some() {
            self.send_email_flag = send_email_flag;
        }
        if send_whatsapp_flag.is_some() {
            self.send_whatsapp_flag = send_whatsapp_flag;
        }
    }

    /// Owned variant of [`Record::merge`].
    pub fn merged(mut self, patch: Record) -> Self {
        self.merge(patch);
        self
    }
}
