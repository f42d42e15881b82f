use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::instrument;

use roombook_config::EmailConfig;
use roombook_core::AppError;

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn confirmation_link(&self, token: &str) -> String {
        format!("{}/confirm-email?token={}", self.config.frontend_url, token)
    }

    pub fn reset_link(&self, email: &str, token: &str) -> String {
        format!(
            "{}/reset-password?email={}&token={}",
            self.config.frontend_url, email, token
        )
    }

    #[instrument(skip(self, token))]
    pub async fn send_email_confirmation(
        &self,
        to_email: &str,
        to_name: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let link = self.confirmation_link(token);
        let text_body = format!(
            "Hi {},\n\n\
             Welcome to Roombook. Please confirm your email address:\n\
             {}\n\n\
             This link will expire in 2 days.\n\n\
             Roombook",
            to_name, link
        );
        let html_body = render_template(
            "Confirm your email",
            to_name,
            "Welcome to Roombook. Please confirm your email address to finish setting up your account.",
            "Confirm Email",
            &link,
            "This link will expire in 2 days.",
        );

        self.send_email(to_email, "Confirm your email", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, token))]
    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let link = self.reset_link(to_email, token);
        let text_body = format!(
            "Hi {},\n\n\
             You requested to reset your password.\n\n\
             Reset code: {}\n\
             Or open: {}\n\n\
             This link will expire in 1 hour.\n\n\
             If you didn't request this, please ignore this email.\n\n\
             Roombook",
            to_name, token, link
        );
        let html_body = render_template(
            "Password Reset Request",
            to_name,
            "We received a request to reset your password. Click the button below to choose a new one.",
            "Reset Password",
            &link,
            "This link will expire in 1 hour. If you didn't request it, ignore this email.",
        );

        self.send_email(to_email, "Password Reset Request", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, html_body, text_body))]
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::info!(to = %to_email, subject, body = %text_body, "SMTP disabled, email not sent");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| {
                    AppError::internal_error(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?
            .map_err(|e| AppError::internal_error(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

fn render_template(
    title: &str,
    name: &str,
    intro: &str,
    action: &str,
    link: &str,
    footer: &str,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 20px; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <table width="600" align="center" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px;">
        <tr>
            <td style="background-color: #0F766E; padding: 24px; text-align: center;">
                <h1 style="margin: 0; color: #ffffff; font-size: 26px;">Roombook</h1>
            </td>
        </tr>
        <tr>
            <td style="padding: 32px 28px; color: #444444; font-size: 15px; line-height: 1.5;">
                <h2 style="margin: 0 0 16px 0; color: #222222;">{title}</h2>
                <p>Hi <strong>{name}</strong>,</p>
                <p>{intro}</p>
                <p style="text-align: center; margin: 28px 0;">
                    <a href="{link}" style="padding: 12px 36px; background-color: #0F766E; color: #ffffff; text-decoration: none; border-radius: 6px; font-weight: bold;">{action}</a>
                </p>
                <p style="font-size: 13px; word-break: break-all;">{link}</p>
                <p style="font-size: 13px;">{footer}</p>
            </td>
        </tr>
    </table>
</body>
</html>"#
    )
}
