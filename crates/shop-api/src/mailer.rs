//! # SMTP Order Confirmations
//!
//! `OrderNotifier` implementation over lettre. Builds a multipart message
//! with product images embedded inline. Every failure here is soft: the
//! orchestrator logs it and the order stands.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use shop_core::{Order, OrderNotifier, ShopError, ShopResult};
use tracing::{debug, info, warn};

/// SMTP relay configuration
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// From address, e.g. "Shop Cart <orders@example.com>"
    pub from_address: String,
}

impl MailerConfig {
    /// Load from environment. Returns `None` when `SMTP_HOST` is unset;
    /// the caller falls back to log-only notifications.
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            smtp_username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "orders@localhost".to_string()),
        })
    }
}

/// Sends order confirmations over SMTP with inline product images
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    http: reqwest::Client,
}

impl SmtpNotifier {
    pub fn new(config: MailerConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::new(config.smtp_username, config.smtp_password);

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address,
            http: reqwest::Client::new(),
        })
    }

    /// Fetch an image for inline embedding. Any failure skips the image.
    async fn fetch_image(&self, url: &str) -> Option<(Vec<u8>, String)> {
        let response = self.http.get(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response.bytes().await.ok()?;
        Some((bytes.to_vec(), content_type))
    }

    fn render_html(order: &Order) -> String {
        let mut rows = String::new();
        for item in &order.items {
            let image = item
                .image_url
                .as_ref()
                .map(|_| {
                    format!(
                        r#"<img src="cid:{}" alt="{}" width="64">"#,
                        item.product_id, item.name
                    )
                })
                .unwrap_or_default();
            rows.push_str(&format!(
                "<tr><td>{image}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                item.name, item.quantity, item.unit_price, item.line_total
            ));
        }

        format!(
            r#"<h2>Thanks for your order, {first_name}!</h2>
<p>Order <code>{id}</code> is confirmed and paid.</p>
<table>
  <tr><th></th><th>Item</th><th>Qty</th><th>Unit</th><th>Total</th></tr>
  {rows}
</table>
<p>Subtotal: {subtotal}<br>Tax: {tax}<br><strong>Total: {total}</strong></p>
<p>Shipping to: {address}, {city}, {state} {zipcode}</p>"#,
            first_name = order.shipping.first_name,
            id = order.id,
            subtotal = order.subtotal,
            tax = order.tax,
            total = order.total,
            address = order.shipping.address,
            city = order.shipping.city,
            state = order.shipping.state,
            zipcode = order.shipping.zipcode,
        )
    }
}

#[async_trait]
impl OrderNotifier for SmtpNotifier {
    async fn order_confirmed(&self, order: &Order) -> ShopResult<()> {
        let to: Mailbox = order
            .shipping
            .email
            .parse()
            .map_err(|_| ShopError::NotificationFailure("invalid recipient address".into()))?;
        let from: Mailbox = self
            .from_address
            .parse()
            .map_err(|_| ShopError::NotificationFailure("invalid from address".into()))?;

        let html = Self::render_html(order);
        let mut body = MultiPart::related().singlepart(SinglePart::html(html));

        for item in &order.items {
            let Some(url) = item.image_url.as_deref() else {
                continue;
            };
            match self.fetch_image(url).await {
                Some((bytes, content_type)) => {
                    let Ok(mime) = ContentType::parse(&content_type) else {
                        debug!(product_id = %item.product_id, %content_type, "unparseable image content type");
                        continue;
                    };
                    body = body.singlepart(
                        Attachment::new_inline(item.product_id.clone()).body(bytes, mime),
                    );
                }
                None => {
                    debug!(product_id = %item.product_id, "could not inline product image");
                }
            }
        }

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(format!("Order confirmed: {}", order.id))
            .multipart(body)
            .map_err(|e| ShopError::NotificationFailure(e.to_string()))?;

        match self.mailer.send(message).await {
            Ok(_) => {
                info!(order_id = %order.id, "order confirmation sent");
                Ok(())
            }
            Err(e) => {
                warn!(order_id = %order.id, "smtp send failed: {e}");
                Err(ShopError::NotificationFailure(e.to_string()))
            }
        }
    }
}
