/// Alert notification: composes the operator message for a point whose
/// alert level is above normal and hands it to a delivery backend.
///
/// Delivery is behind the `Notifier` trait. The service ships two
/// backends: `LogNotifier` writes the message to the log, and
/// `OutboxNotifier` drops one text file per message into a directory for
/// an external mail relay to pick up.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::alert::assessment::PointAssessment;
use crate::alert::thresholds::AlertLevel;
use crate::logging::DataSource;

pub const DEFAULT_USER_ENV: &str = "EMAIL_USER";
pub const DEFAULT_PASS_ENV: &str = "EMAIL_PASS";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum NotifyError {
    /// Filesystem failure while writing a message.
    Io { path: PathBuf, message: String },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::Io { path, message } => {
                write!(f, "Failed to write notification {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for NotifyError {}

// ---------------------------------------------------------------------------
// Sender credentials
// ---------------------------------------------------------------------------

/// The mailbox alerts are sent from (and to).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub address: String,
}

impl Sender {
    /// Reads the sender from the environment.
    ///
    /// Returns `None` when either variable is unset or empty.
    pub fn from_env(user_var: &str, pass_var: &str) -> Option<Sender> {
        Sender::from_lookup(user_var, pass_var, |name| std::env::var(name).ok())
    }

    /// Same as `from_env`, with an explicit variable lookup.
    pub fn from_lookup<F>(user_var: &str, pass_var: &str, lookup: F) -> Option<Sender>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup(user_var).filter(|v| !v.trim().is_empty())?;
        lookup(pass_var).filter(|v| !v.is_empty())?;
        Some(Sender { address: address.trim().to_string() })
    }
}

// ---------------------------------------------------------------------------
// Message composition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertNotification {
    pub point_id: String,
    pub level: AlertLevel,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Builds the alert message for `assessment`.
///
/// The subject timestamp is rendered in the point's local time.
pub fn compose(assessment: &PointAssessment, sender: &Sender, sent_at: DateTime<Utc>) -> AlertNotification {
    let level = assessment.level;
    let local = sent_at.with_timezone(assessment.observed_at_local.offset());
    let point = &assessment.point;

    let subject = format!("GEOALERTA: Level {} - {}", level.as_u8(), local.format("%d/%m %H:%M"));

    let soil = match assessment.soil_moisture {
        Some(h) => format!("{:.2} m3/m3", h),
        None => "n/a".to_string(),
    };

    let body = format!(
        "AUTOMATIC THREAT REPORT\n\
         -----------------------\n\
         LEVEL: {}\n\
         STATUS: {}\n\
         \n\
         TECHNICAL DATA:\n\
         - Point: {} ({})\n\
         - Location: {:.4}, {:.4}\n\
         - Susceptibility: {:.2}\n\
         - Rain 72h: {:.1} mm\n\
         - Soil moisture: {}\n\
         - Observed at: {}\n\
         \n\
         Required action: verify local conditions.\n",
        level.as_u8(),
        level.message(),
        point.name,
        point.id,
        point.latitude,
        point.longitude,
        point.susceptibility,
        assessment.rain_72h_mm,
        soil,
        assessment.observed_at_local.format("%Y-%m-%d %H:%M %:z"),
    );

    AlertNotification {
        point_id: point.id.clone(),
        level,
        from: sender.address.clone(),
        to: sender.address.clone(),
        subject,
        body,
        sent_at,
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

pub trait Notifier {
    fn deliver(&self, notification: &AlertNotification) -> Result<(), NotifyError>;
}

/// Writes each notification to the log at warn level.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, notification: &AlertNotification) -> Result<(), NotifyError> {
        tracing::warn!(
            source = DataSource::Notify.as_str(),
            point = notification.point_id.as_str(),
            to = notification.to.as_str(),
            "{}\n{}",
            notification.subject,
            notification.body
        );
        Ok(())
    }
}

/// Writes each notification as a text file under `dir`.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    dir: PathBuf,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        OutboxNotifier { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, notification: &AlertNotification) -> PathBuf {
        self.dir.join(format!(
            "{}-{}-level{}.txt",
            notification.sent_at.format("%Y%m%dT%H%M%SZ"),
            notification.point_id,
            notification.level.as_u8()
        ))
    }
}

impl Notifier for OutboxNotifier {
    fn deliver(&self, notification: &AlertNotification) -> Result<(), NotifyError> {
        fs::create_dir_all(&self.dir).map_err(|e| NotifyError::Io {
            path: self.dir.clone(),
            message: e.to_string(),
        })?;

        let path = self.path_for(notification);
        let contents = format!(
            "From: {}\nTo: {}\nSubject: {}\n\n{}",
            notification.from, notification.to, notification.subject, notification.body
        );

        fs::write(&path, contents).map_err(|e| NotifyError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;

        tracing::info!(
            source = DataSource::Notify.as_str(),
            point = notification.point_id.as_str(),
            "Queued notification {}",
            path.display()
        );
        Ok(())
    }
}

/// Notifies every assessment above `Normal`. Returns the number delivered.
///
/// Without a sender nothing is composed; a warning is logged if any
/// assessment needed a notification. Individual delivery failures are
/// logged and do not stop the remaining notifications.
pub fn dispatch(
    assessments: &[PointAssessment],
    sender: Option<&Sender>,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> usize {
    let pending: Vec<&PointAssessment> =
        assessments.iter().filter(|a| a.level > AlertLevel::Normal).collect();

    if pending.is_empty() {
        return 0;
    }

    let Some(sender) = sender else {
        tracing::warn!(
            source = DataSource::Notify.as_str(),
            "Email credentials not configured; skipping {} notification(s)",
            pending.len()
        );
        return 0;
    };

    let mut delivered = 0;
    for assessment in pending {
        let notification = compose(assessment, sender, now);
        match notifier.deliver(&notification) {
            Ok(()) => delivered += 1,
            Err(e) => tracing::error!(
                source = DataSource::Notify.as_str(),
                point = assessment.point.id.as_str(),
                "{}",
                e
            ),
        }
    }
    delivered
}
