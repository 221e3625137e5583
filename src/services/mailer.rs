use crate::config::MailConfig;
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use uuid::Uuid;

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

impl EmailMessage {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        from: impl Into<String>,
        to: Vec<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            from: from.into(),
            to,
        }
    }

    /// Formats the message with RFC 5322 headers and CRLF line endings.
    pub fn to_rfc5322(&self, date: DateTime<Utc>) -> String {
        let domain = self.from.rsplit('@').next().unwrap_or("localhost");
        let mut out = String::new();
        out.push_str(&format!("From: {}\r\n", self.from));
        out.push_str(&format!("To: {}\r\n", self.to.join(", ")));
        out.push_str(&format!("Subject: {}\r\n", self.subject));
        out.push_str(&format!("Date: {}\r\n", date.to_rfc2822()));
        out.push_str(&format!("Message-ID: <{}@{}>\r\n", Uuid::new_v4(), domain));
        out.push_str("MIME-Version: 1.0\r\n");
        out.push_str("Content-Type: text/plain; charset=\"utf-8\"\r\n");
        out.push_str("Content-Transfer-Encoding: 8bit\r\n");
        out.push_str("\r\n");
        for line in self.body.lines() {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out
    }
}

/// Trait for outbound mail transports
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Writes messages to the log instead of delivering them
pub struct ConsoleMailer;

#[async_trait::async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            target: "mail",
            from = %message.from,
            to = %message.to.join(", "),
            subject = %message.subject,
            "{}",
            message.body
        );
        Ok(())
    }
}

/// Stores each message as a separate file in a directory
pub struct FileMailer {
    dir: PathBuf,
}

impl FileMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl Mailer for FileMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let now = Utc::now();
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create mail directory {:?}", self.dir))?;

        let path = self
            .dir
            .join(format!("{}-{}.log", now.format("%Y%m%d-%H%M%S"), Uuid::new_v4()));
        tokio::fs::write(&path, message.to_rfc5322(now))
            .await
            .with_context(|| format!("Failed to write message to {:?}", path))?;

        tracing::debug!("Stored outgoing mail at {:?}", path);
        Ok(())
    }
}

/// Minimal SMTP client for an unauthenticated relay
pub struct SmtpMailer {
    host: String,
    port: u16,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(host: String, port: u16, timeout: Duration) -> Self {
        Self {
            host,
            port,
            timeout,
        }
    }

    async fn connect(&self) -> Result<TcpStream> {
        let addr = format!("{}:{}", self.host, self.port);
        TcpStream::connect(&addr)
            .await
            .map_err(|e| anyhow!("Failed to connect to SMTP server at {}: {}", addr, e))
    }

    async fn deliver(&self, message: &EmailMessage) -> Result<()> {
        if message.to.is_empty() {
            bail!("Message has no recipients");
        }

        let stream = self.connect().await?;
        let (read_half, mut writer) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        expect_reply(&mut reader, 2, "greeting").await?;

        writer.write_all(b"EHLO localhost\r\n").await?;
        expect_reply(&mut reader, 2, "EHLO").await?;

        writer
            .write_all(format!("MAIL FROM:<{}>\r\n", message.from).as_bytes())
            .await?;
        expect_reply(&mut reader, 2, "MAIL FROM").await?;

        for rcpt in &message.to {
            writer
                .write_all(format!("RCPT TO:<{}>\r\n", rcpt).as_bytes())
                .await?;
            expect_reply(&mut reader, 2, "RCPT TO").await?;
        }

        writer.write_all(b"DATA\r\n").await?;
        expect_reply(&mut reader, 3, "DATA").await?;

        writer
            .write_all(dot_stuff(&message.to_rfc5322(Utc::now())).as_bytes())
            .await?;
        writer.write_all(b".\r\n").await?;
        expect_reply(&mut reader, 2, "message body").await?;

        writer.write_all(b"QUIT\r\n").await?;
        // The message is already accepted, a missing 221 does not matter.
        let _ = read_reply(&mut reader).await;

        Ok(())
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tokio::time::timeout(self.timeout, self.deliver(message))
            .await
            .map_err(|_| {
                anyhow!(
                    "SMTP conversation with {}:{} timed out after {:?}",
                    self.host,
                    self.port,
                    self.timeout
                )
            })?
    }
}

/// Reads one (possibly multi-line) SMTP reply.
async fn read_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<(u16, String)> {
    let mut text = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            bail!("SMTP server closed the connection");
        }

        let code = line
            .get(..3)
            .and_then(|c| c.parse::<u16>().ok())
            .ok_or_else(|| anyhow!("Malformed SMTP reply: {}", line.trim_end()))?;

        text.push_str(line.get(4..).unwrap_or("").trim_end());
        if line.as_bytes().get(3) != Some(&b'-') {
            return Ok((code, text));
        }
        text.push('\n');
    }
}

async fn expect_reply<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    class: u16,
    stage: &str,
) -> Result<()> {
    let (code, text) = read_reply(reader).await?;
    if code / 100 != class {
        bail!("SMTP server rejected {}: {} {}", stage, code, text);
    }
    Ok(())
}

/// Escapes lines starting with '.' so they are not read as end of data.
fn dot_stuff(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    for line in data.split_inclusive("\r\n") {
        if line.starts_with('.') {
            out.push('.');
        }
        out.push_str(line);
    }
    out
}

/// Keeps messages in memory, used by tests and development setups
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<EmailMessage>>,
    fail_with: Option<String>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose transport always rejects the message
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outbox: Mutex::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    pub fn outbox(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if let Some(reason) = &self.fail_with {
            bail!("{}", reason);
        }
        self.outbox
            .lock()
            .map_err(|_| anyhow!("Outbox lock poisoned"))?
            .push(message.clone());
        Ok(())
    }
}

/// Factory function to create the configured mail transport
pub fn create_mailer(config: &MailConfig) -> Arc<dyn Mailer> {
    match config.backend.to_lowercase().as_str() {
        "smtp" => Arc::new(SmtpMailer::new(
            config.smtp_host.clone(),
            config.smtp_port,
            Duration::from_secs(config.smtp_timeout_secs),
        )),
        "file" => Arc::new(FileMailer::new(config.file_path.clone())),
        "memory" | "locmem" => Arc::new(MemoryMailer::new()),
        "console" => Arc::new(ConsoleMailer),
        _ => {
            tracing::warn!(
                "Unknown mail backend '{}', using ConsoleMailer",
                config.backend
            );
            Arc::new(ConsoleMailer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn message() -> EmailMessage {
        EmailMessage::new(
            "New upload.",
            "File a.txt with size 5 has been uploaded.",
            "noreply@example.com",
            vec!["guest@example.com".to_string()],
        )
    }

    /// Scripted SMTP server accepting one session; `reject` maps a command
    /// prefix to the reply it should get instead of 250.
    async fn fake_smtp_server(
        reject: Option<(&'static str, &'static str)>,
    ) -> (u16, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut writer) = stream.into_split();
            let mut reader = BufReader::new(read_half);
            let mut transcript = Vec::new();
            let mut in_data = false;

            writer.write_all(b"220 test ESMTP ready\r\n").await.unwrap();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
                transcript.push(line.clone());

                if in_data {
                    if line == ".\r\n" {
                        in_data = false;
                        writer.write_all(b"250 queued\r\n").await.unwrap();
                    }
                    continue;
                }

                let command = line.to_ascii_uppercase();
                if let Some((prefix, reply)) = reject {
                    if command.starts_with(prefix) {
                        writer.write_all(reply.as_bytes()).await.unwrap();
                        continue;
                    }
                }

                if command.starts_with("EHLO") {
                    writer
                        .write_all(b"250-test greets you\r\n250 8BITMIME\r\n")
                        .await
                        .unwrap();
                } else if command.starts_with("DATA") {
                    in_data = true;
                    writer.write_all(b"354 end with .\r\n").await.unwrap();
                } else if command.starts_with("QUIT") {
                    writer.write_all(b"221 bye\r\n").await.unwrap();
                    break;
                } else {
                    writer.write_all(b"250 ok\r\n").await.unwrap();
                }
            }
            transcript
        });

        (port, handle)
    }

    #[tokio::test]
    async fn test_smtp_mailer_delivers_message() {
        let (port, server) = fake_smtp_server(None).await;
        let mailer = SmtpMailer::new("127.0.0.1".to_string(), port, Duration::from_secs(5));

        mailer.send(&message()).await.unwrap();

        let transcript = server.await.unwrap();
        assert!(transcript.contains(&"MAIL FROM:<noreply@example.com>\r\n".to_string()));
        assert!(transcript.contains(&"RCPT TO:<guest@example.com>\r\n".to_string()));
        assert!(transcript.contains(&"Subject: New upload.\r\n".to_string()));
        assert!(
            transcript.contains(&"File a.txt with size 5 has been uploaded.\r\n".to_string())
        );
        assert_eq!(transcript.last().unwrap(), "QUIT\r\n");
    }

    #[tokio::test]
    async fn test_smtp_mailer_reports_rejected_recipient() {
        let (port, server) = fake_smtp_server(Some(("RCPT", "550 no such user\r\n"))).await;
        let mailer = SmtpMailer::new("127.0.0.1".to_string(), port, Duration::from_secs(5));

        let err = mailer.send(&message()).await.unwrap_err();
        assert!(err.to_string().contains("550"), "unexpected error: {err}");

        drop(mailer);
        let transcript = server.await.unwrap();
        assert!(!transcript.iter().any(|l| l.starts_with("DATA")));
    }

    #[tokio::test]
    async fn test_smtp_mailer_unreachable_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mailer = SmtpMailer::new("127.0.0.1".to_string(), port, Duration::from_secs(5));
        assert!(mailer.send(&message()).await.is_err());
    }

    #[test]
    fn test_dot_stuffing() {
        assert_eq!(dot_stuff("a\r\n.b\r\n..c\r\n"), "a\r\n..b\r\n...c\r\n");
    }

    #[test]
    fn test_rfc5322_format() {
        let rendered = message().to_rfc5322(Utc::now());
        assert!(rendered.starts_with("From: noreply@example.com\r\nTo: guest@example.com\r\n"));
        assert!(rendered.contains("\r\n\r\nFile a.txt with size 5 has been uploaded.\r\n"));
        assert!(rendered.contains("Message-ID: <"));
    }

    #[tokio::test]
    async fn test_file_mailer_writes_message() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = FileMailer::new(dir.path().join("mail"));

        mailer.send(&message()).await.unwrap();

        let mut entries = std::fs::read_dir(dir.path().join("mail")).unwrap();
        let entry = entries.next().unwrap().unwrap();
        let content = std::fs::read_to_string(entry.path()).unwrap();
        assert!(content.contains("Subject: New upload.\r\n"));
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn test_memory_mailer() {
        let mailer = MemoryMailer::new();
        mailer.send(&message()).await.unwrap();
        assert_eq!(mailer.outbox(), vec![message()]);

        let failing = MemoryMailer::failing("connection refused");
        assert!(failing.send(&message()).await.is_err());
        assert!(failing.outbox().is_empty());
    }

    #[tokio::test]
    async fn test_create_mailer() {
        let mut config = MailConfig::default();
        config.backend = "memory".to_string();
        let mailer = create_mailer(&config);
        assert!(mailer.send(&message()).await.is_ok());

        config.backend = "carrier-pigeon".to_string();
        let mailer = create_mailer(&config);
        assert!(mailer.send(&message()).await.is_ok());
    }
}
