//! Transition notifications.
//!
//! Two independent channels, both fire-and-forget: a mail handed to the
//! local MTA (`sendmail -t`) and an external alert command. Failures are
//! logged and dropped; they never reach the probe state.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error};

use crate::APP_NAME;
use crate::probe::{Probe, Recipient};
use crate::state::Transition;

/// Standard submission interface of a local mail transport agent.
pub const SENDMAIL_PATH: &str = "/usr/sbin/sendmail";

/// Receives every transition of every probe.
pub trait Notifier: Send + Sync {
    /// Called from the poll loop, so it must return immediately.
    fn notify(&self, probe: &Probe, transition: &Transition);
}

/// Minimal RFC 822 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: Option<String>,
}

impl MailMessage {
    pub fn new(recipient: &Recipient, transition: &Transition) -> Self {
        Self {
            to: recipient.to_header(),
            subject: transition.subject(),
            body: transition.message.clone(),
        }
    }

    /// Message text as written to the MTA's standard input.
    pub fn render(&self) -> String {
        format!(
            "To: {}\nSubject: {}\nX-Mailer: {APP_NAME}\n\n{}\n.\n",
            self.to,
            self.subject,
            self.body.as_deref().unwrap_or_default()
        )
    }
}

/// Positional arguments of the alert command: `failed name [message]`.
pub fn alert_args(transition: &Transition) -> Vec<String> {
    let mut args = vec![transition.failed.to_string(), transition.name.clone()];
    if let Some(message) = &transition.message {
        args.push(message.clone());
    }
    args
}

/// Production notifier: spawns one detached task per channel and never
/// awaits it.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sendmail: PathBuf,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_sendmail(SENDMAIL_PATH)
    }
}

impl Dispatcher {
    pub fn with_sendmail(path: impl Into<PathBuf>) -> Self {
        Self { sendmail: path.into() }
    }
}

impl Notifier for Dispatcher {
    fn notify(&self, probe: &Probe, transition: &Transition) {
        if let Some(recipient) = &probe.notify {
            let message = MailMessage::new(recipient, transition);
            let sendmail = self.sendmail.clone();
            tokio::spawn(async move {
                match send_mail(&sendmail, &message).await {
                    Ok(()) => debug!(to = %message.to, subject = %message.subject, "mail submitted"),
                    Err(e) => error!(to = %message.to, subject = %message.subject, "mail notification failed: {e:#}"),
                }
            });
        }

        if let Some(command) = &probe.alert {
            let command = command.clone();
            let args = alert_args(transition);
            tokio::spawn(async move {
                if let Err(e) = run_alert(&command, &args).await {
                    error!(%command, "alert failed: {e:#}");
                }
            });
        }
    }
}

/// Submit `message` through `sendmail -t`.
pub async fn send_mail(sendmail: &Path, message: &MailMessage) -> Result<()> {
    let mut child = Command::new(sendmail)
        .arg("-t")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start {}", sendmail.display()))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(message.render().as_bytes()).await?;
        // Closing stdin ends the message.
        drop(stdin);
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        bail!(
            "{} exited with {}: {}",
            sendmail.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim_end()
        );
    }
    Ok(())
}

/// Run the alert command once with `args`.
pub async fn run_alert(command: &str, args: &[String]) -> Result<()> {
    let output = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("failed to run {command}"))?;

    if !output.status.success() {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        bail!("{command} failed with {}\n{}", output.status, combined.trim_end());
    }
    Ok(())
}
