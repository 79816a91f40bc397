// service/stats_service.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::Storage,
    models::ticketmodel::{Ticket, TicketStatus},
    service::error::ServiceError,
};

/// Every completed ticket is assumed to take this long. There is no
/// completion timestamp to measure against.
pub const SIMULATED_COMPLETION_HOURS: f64 = 48.0;

const FAULT_KEYWORDS: &[(&str, &[&str])] = &[
    ("printer", &["printer", "print", "cartridge", "mfp", "scanner"]),
    ("computer", &["computer", "pc", "laptop", "windows", "system"]),
    ("network", &["network", "internet", "wi-fi", "wifi", "connection"]),
    ("software", &["program", "software", "install", "office"]),
    ("peripherals", &["monitor", "keyboard", "mouse", "equipment"]),
];

const OTHER_CATEGORY: &str = "other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Week,
    Month,
    #[default]
    All,
}

impl StatsPeriod {
    fn window(&self) -> Option<Duration> {
        match self {
            StatsPeriod::Week => Some(Duration::days(7)),
            StatsPeriod::Month => Some(Duration::days(30)),
            StatsPeriod::All => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultCategory {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketStats {
    pub period: StatsPeriod,
    pub total_tickets: usize,
    pub pending_tickets: usize,
    pub in_progress_tickets: usize,
    pub completed_tickets: usize,
    pub completion_rate: f64,
    pub fault_categories: Vec<FaultCategory>,
    pub simulated_avg_completion_hours: Option<f64>,
    pub avg_completion_is_simulated: bool,
}

pub fn fault_category(title: &str) -> &'static str {
    let title = title.to_lowercase();
    FAULT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| title.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(OTHER_CATEGORY)
}

pub fn summarize(tickets: &[Ticket], period: StatsPeriod, now: DateTime<Utc>) -> TicketStats {
    let since = period.window().map(|window| now - window);
    let in_range: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| since.map_or(true, |since| t.created_at >= since))
        .collect();

    let count = |status: TicketStatus| in_range.iter().filter(|t| t.status == status).count();

    let total_tickets = in_range.len();
    let completed_tickets = count(TicketStatus::Completed);
    let completion_rate = if total_tickets > 0 {
        completed_tickets as f64 / total_tickets as f64 * 100.0
    } else {
        0.0
    };

    let mut fault_categories: Vec<FaultCategory> = FAULT_KEYWORDS
        .iter()
        .map(|(category, _)| *category)
        .chain(std::iter::once(OTHER_CATEGORY))
        .map(|category| FaultCategory {
            category: category.to_string(),
            count: 0,
        })
        .collect();
    for ticket in &in_range {
        let category = fault_category(&ticket.title);
        if let Some(entry) = fault_categories.iter_mut().find(|c| c.category == category) {
            entry.count += 1;
        }
    }

    TicketStats {
        period,
        total_tickets,
        pending_tickets: count(TicketStatus::Pending),
        in_progress_tickets: count(TicketStatus::InProgress),
        completed_tickets,
        completion_rate,
        fault_categories,
        simulated_avg_completion_hours: (completed_tickets > 0)
            .then_some(SIMULATED_COMPLETION_HOURS),
        avg_completion_is_simulated: true,
    }
}

#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn Storage>,
}

impl StatsService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    pub async fn collect(&self, period: StatsPeriod) -> Result<TicketStats, ServiceError> {
        let tickets: Vec<Ticket> = self
            .store
            .get_all_tickets()
            .await?
            .into_iter()
            .map(|t| t.ticket)
            .collect();

        Ok(summarize(&tickets, period, Utc::now()))
    }
}
