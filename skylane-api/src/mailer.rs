use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use skylane_core::CoreError;
use skylane_store::{BookingRepo, FlightRepo, UserRepo};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// Notification jobs carry ids only; the worker loads current state when
/// it runs, so a stale queue entry never sends stale data.
#[derive(Debug, Clone)]
pub enum EmailJob {
    Registered { user_id: Uuid },
    Approved { user_id: Uuid },
    Rejected { user_id: Uuid },
    BookingConfirmed { booking_id: Uuid },
}

/// Fire-and-forget producer handed to request handlers. The request path
/// never blocks on email delivery.
#[derive(Clone)]
pub struct MailerHandle {
    tx: mpsc::UnboundedSender<EmailJob>,
}

impl MailerHandle {
    pub fn enqueue(&self, job: EmailJob) {
        if self.tx.send(job).is_err() {
            error!("email worker is gone, dropping notification job");
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// SMTP delivery via lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: String,
        from_address: String,
    ) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();
        Ok(Self {
            transport,
            from_address,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Logs instead of sending. Used when SMTP is not configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
        info!("email delivery disabled, would send '{subject}' to {to}");
        Ok(())
    }
}

pub struct MailerDeps {
    pub users: UserRepo,
    pub flights: FlightRepo,
    pub bookings: BookingRepo,
    pub mailer: Arc<dyn Mailer>,
}

/// Spawn the background worker and return the producer handle. Jobs are
/// processed one at a time; a send failure is retried up to 3 times with
/// a fixed 60-second backoff, then dropped with an error log. A missing
/// user/booking is terminal and never retried.
pub fn spawn_worker(deps: MailerDeps) -> (MailerHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<EmailJob>();
    let handle = tokio::spawn(async move {
        info!("email worker started");
        while let Some(job) = rx.recv().await {
            deliver(&deps, job).await;
        }
        info!("email worker stopped");
    });
    (MailerHandle { tx }, handle)
}

async fn deliver(deps: &MailerDeps, job: EmailJob) {
    let rendered = match render(deps, &job).await {
        Ok(rendered) => rendered,
        Err(CoreError::NotFound(msg)) => {
            // Row was deleted between enqueue and delivery; nothing to
            // retry against.
            error!("dropping notification job: {msg}");
            return;
        }
        Err(err) => {
            error!("failed to prepare notification: {err}");
            return;
        }
    };
    send_with_retry(
        deps.mailer.as_ref(),
        &rendered.to,
        &rendered.subject,
        &rendered.body,
    )
    .await;
}

pub async fn send_with_retry(mailer: &dyn Mailer, to: &str, subject: &str, body: &str) {
    for attempt in 1..=MAX_ATTEMPTS {
        match mailer.send(to, subject, body).await {
            Ok(()) => {
                info!("sent '{subject}' to {to}");
                return;
            }
            Err(err) => {
                error!("attempt {attempt}/{MAX_ATTEMPTS} to send '{subject}' failed: {err}");
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
            }
        }
    }
    error!("giving up on '{subject}' to {to} after {MAX_ATTEMPTS} attempts");
}

struct RenderedEmail {
    to: String,
    subject: String,
    body: String,
}

async fn render(deps: &MailerDeps, job: &EmailJob) -> Result<RenderedEmail, CoreError> {
    match job {
        EmailJob::Registered { user_id } => {
            let user = deps.users.get(*user_id).await?;
            Ok(RenderedEmail {
                to: user.email.clone(),
                subject: "Welcome to Skylane - Account Pending Approval".to_string(),
                body: format!(
                    "Hi {},\n\n\
                     Thank you for registering with Skylane!\n\n\
                     Your account is currently pending approval from our administrators.\n\
                     You will receive another email once your account has been approved.\n\n\
                     Expected approval time: within 24 hours.\n\n\
                     Best regards,\n\
                     The Skylane Team\n",
                    user.username
                ),
            })
        }
        EmailJob::Approved { user_id } => {
            let user = deps.users.get(*user_id).await?;
            Ok(RenderedEmail {
                to: user.email.clone(),
                subject: "Your Skylane Account Has Been Approved!".to_string(),
                body: format!(
                    "Hi {},\n\n\
                     Your account has been approved and you can now log in to start\n\
                     booking your flights.\n\n\
                     Here's what you can do:\n\
                     - Search for flights across multiple airlines\n\
                     - Book and manage your flight reservations\n\
                     - View your booking history\n\n\
                     Best regards,\n\
                     The Skylane Team\n",
                    user.username
                ),
            })
        }
        EmailJob::Rejected { user_id } => {
            let user = deps.users.get(*user_id).await?;
            Ok(RenderedEmail {
                to: user.email.clone(),
                subject: "Your Skylane Account Registration Update".to_string(),
                body: format!(
                    "Hi {},\n\n\
                     Thank you for registering with Skylane.\n\n\
                     Unfortunately, your account registration has been rejected.\n\
                     This could be due to incomplete registration information,\n\
                     verification issues or policy restrictions.\n\n\
                     Please contact our support team for more information.\n\n\
                     Best regards,\n\
                     The Skylane Team\n",
                    user.username
                ),
            })
        }
        EmailJob::BookingConfirmed { booking_id } => {
            let booking = deps.bookings.get(*booking_id).await?;
            let user = deps.users.get(booking.user_id).await?;
            let flight = deps.flights.get(booking.flight_id).await?;
            Ok(RenderedEmail {
                to: user.email.clone(),
                subject: format!("Booking Confirmed - {}", flight.flight_number),
                body: format!(
                    "Hi {},\n\n\
                     Thank you for your booking! Here are your details:\n\n\
                     Booking ID: {}\n\
                     Flight Number: {}\n\
                     From: {}\n\
                     To: {}\n\
                     Date: {}\n\
                     Price: ${:.2}\n\
                     Payment Status: {}\n\n\
                     Please arrive at the airport at least 2 hours before departure\n\
                     and bring a valid photo ID with your booking confirmation.\n\n\
                     Best regards,\n\
                     The Skylane Team\n",
                    user.username,
                    booking.id,
                    flight.flight_number,
                    flight.departure,
                    flight.arrival,
                    flight.departure_at.format("%Y-%m-%d %H:%M"),
                    flight.price,
                    booking.payment_status.as_str().to_uppercase(),
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyMailer {
        attempts: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> anyhow::Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.fail_first {
                anyhow::bail!("smtp connection refused");
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_retries_with_backoff_then_succeeds() {
        let mailer = FlakyMailer {
            attempts: AtomicU32::new(0),
            fail_first: 2,
        };
        send_with_retry(&mailer, "alice@example.com", "Test", "body").await;
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_gives_up_after_three_attempts() {
        let mailer = FlakyMailer {
            attempts: AtomicU32::new(0),
            fail_first: 10,
        };
        send_with_retry(&mailer, "alice@example.com", "Test", "body").await;
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }
}
