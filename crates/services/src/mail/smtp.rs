use async_trait::async_trait;
use campus_config::SmtpSettings;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{
        Mailbox, Mailboxes,
        header::{ContentType, To},
    },
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};
use tracing::debug;

use super::{MailError, MailOptions, MailTransport};

/// SMTP delivery. `secure` selects implicit TLS; otherwise STARTTLS is used
/// when the server offers it.
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            let tls = TlsParameters::new(settings.host.clone())
                .map_err(|e| MailError::Transport(e.to_string()))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
                .tls(Tls::Opportunistic(tls))
        };

        let mut builder = builder.port(settings.port);
        if let (Some(user), Some(pass)) = (&settings.user, &settings.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

pub(crate) fn build_message(options: &MailOptions) -> Result<Message, MailError> {
    let from: Mailbox = options
        .from
        .parse()
        .map_err(|_| MailError::InvalidAddress(options.from.clone()))?;
    let to: Mailboxes = options
        .to
        .parse()
        .map_err(|_| MailError::InvalidAddress(options.to.clone()))?;

    Message::builder()
        .from(from)
        .mailbox(To::from(to))
        .subject(options.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(options.html.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, options: &MailOptions) -> Result<(), MailError> {
        let message = build_message(options)?;
        self.inner
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        debug!(to = %options.to, "Mail handed to SMTP server");
        Ok(())
    }
}
