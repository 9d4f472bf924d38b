//! Command-line driver: interactive `ask`, one-shot `demo`, and `serve`.

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::error;

use crate::error::Error;
use crate::pipeline::{Pipeline, Record};

#[derive(Debug, Parser)]
#[command(
    name = "weather-agent",
    version,
    about = "Weather lookup → LLM answer → optional email/WhatsApp delivery"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Ask about the weather (prompts for anything not given)")]
    Ask(AskArgs),

    #[command(about = "Run once with the demo city and question")]
    Demo(DemoArgs),

    #[command(about = "Serve the HTTP API")]
    Serve {
        #[arg(long, help = "Bind address (overrides WEATHER_AGENT_HOST)")]
        host: Option<String>,

        #[arg(long, help = "Port (overrides WEATHER_AGENT_PORT)")]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct AskArgs {
    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub question: Option<String>,

    /// Send the answer by email. Prompted for when omitted.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub email: Option<bool>,

    /// Send the answer over WhatsApp. Prompted for when omitted.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub whatsapp: Option<bool>,
}

#[derive(Debug, Clone, Args)]
pub struct DemoArgs {
    #[arg(long, env = "DEMO_CITY", default_value = "Mumbai")]
    pub city: String,

    #[arg(long, env = "DEMO_Q", default_value = "Do I need an umbrella today?")]
    pub question: String,
}

/// `y` (any case, surrounding whitespace ignored) means yes; anything else is no.
pub fn parse_yes(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("y")
}

/// Write `label`, then read one trimmed line. End of input reads as empty.
async fn prompt<R, W>(reader: &mut R, writer: &mut W, label: &str) -> Result<String, Error>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(label.as_bytes()).await?;
    writer.flush().await?;

    let mut line = String::new();
    reader.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

/// Fill in whatever `args` leaves out by prompting, and build the initial record.
pub async fn resolve_request<R, W>(
    args: AskArgs,
    reader: &mut R,
    writer: &mut W,
) -> Result<Record, Error>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let city = match args.city {
        Some(city) => city,
        None => prompt(reader, writer, "City: ").await?,
    };
    let question = match args.question {
        Some(question) => question,
        None => {
            prompt(
                reader,
                writer,
                "Your question (e.g., Do I need an umbrella?): ",
            )
            .await?
        }
    };
    let email = match args.email {
        Some(flag) => flag,
        None => parse_yes(&prompt(reader, writer, "Send to Email? (y/N): ").await?),
    };
    let whatsapp = match args.whatsapp {
        Some(flag) => flag,
        None => parse_yes(&prompt(reader, writer, "Send to WhatsApp? (y/N): ").await?),
    };

    Ok(Record::request(city, question, email, whatsapp))
}

/// Line shown when a run fails. The cause goes to the log only.
pub const RUN_FAILED_LINE: &str = "❌ Weather agent run failed.";

/// Run the pipeline and print the weather text, the answer and `closing`.
///
/// A failed run prints [`RUN_FAILED_LINE`] and returns [`Error::RunFailed`].
async fn run_and_report<W>(
    pipeline: &Pipeline,
    initial: Record,
    closing: &str,
    writer: &mut W,
) -> Result<Record, Error>
where
    W: AsyncWrite + Unpin,
{
    let record = match pipeline.run(initial).await {
        Ok(record) => record,
        Err(e) => {
            error!(error = %e, configuration = e.is_configuration(), "Weather agent run failed");
            let line = format!("\n{RUN_FAILED_LINE}\n");
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
            return Err(Error::RunFailed);
        }
    };

    let report = format!(
        "\n⛅ Weather: {}\n🤖 Agent: {}\n{closing}\n",
        record.weather_text.as_deref().unwrap_or_default(),
        record.answer.as_deref().unwrap_or_default(),
    );
    writer.write_all(report.as_bytes()).await?;
    writer.flush().await?;

    Ok(record)
}

/// Interactive run: resolve the request, run the pipeline, print the result.
pub async fn ask<R, W>(
    pipeline: &Pipeline,
    args: AskArgs,
    reader: &mut R,
    writer: &mut W,
) -> Result<Record, Error>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let initial = resolve_request(args, reader, writer).await?;
    run_and_report(pipeline, initial, "✅ Done.", writer).await
}

/// Demo run: email on, WhatsApp off.
pub async fn demo<W>(pipeline: &Pipeline, args: DemoArgs, writer: &mut W) -> Result<Record, Error>
where
    W: AsyncWrite + Unpin,
{
    let initial = Record::request(args.city, args.question, true, false);
    run_and_report(pipeline, initial, "✅ Notifications sent (if configured).", writer).await
}
