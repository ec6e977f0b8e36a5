// Terminal front end: domain selection, the chat loop, and rendering of the
// conversation log. All conversation logic lives in `jivan::ChatSession`.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use jivan::{ChatSession, CompletionClient, Domain, Message, PromptComposer, SessionError};

const HELP: &str = "Commands: /home (choose another tradition), /switch <tradition>, /help, /quit";

enum Command {
    Quit,
    Home,
    Help,
    Switch(String),
    Say(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    match trimmed {
        "/quit" | "/exit" => Command::Quit,
        "/home" => Command::Home,
        "/help" => Command::Help,
        _ => match trimmed.split_once(char::is_whitespace) {
            Some(("/switch", target)) => Command::Switch(target.trim().to_string()),
            _ if trimmed == "/switch" => Command::Switch(String::new()),
            _ => Command::Say(line.to_string()),
        },
    }
}

/// Forwards every Ctrl-C for as long as the receiver is alive. One listener
/// serves the whole chat, so the idle prompt and an in-flight request see the
/// same stream of interrupts.
pub fn spawn_interrupt_listener() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

/// Accepts a menu number (1-4) or a tradition name.
fn parse_selection(input: &str) -> Option<Domain> {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| Domain::ALL.get(i).copied());
    }
    input.parse().ok()
}

fn render_message(message: &Message, domain: Domain) -> String {
    let sender = if message.is_user() { "You" } else { domain.profile().name };
    format!("{} {}: {}", message.created_at.format("%H:%M:%S"), sender, message.text)
}

fn print_selection_menu<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "Choose Your Spiritual Path")?;
    for (i, domain) in Domain::ALL.iter().enumerate() {
        let profile = domain.profile();
        writeln!(out, "  {}. {} - {} ({})", i + 1, profile.name, profile.native_name, profile.tagline)?;
    }
    writeln!(out, "सर्वे भवन्तु सुखिनः - All paths lead to the same divine truth 🙏")?;
    out.flush()?;
    Ok(())
}

fn print_welcome<W: Write>(out: &mut W, domain: Domain) -> Result<()> {
    let profile = domain.profile();
    writeln!(out, "{}", profile.title)?;
    writeln!(out, "{}", profile.greeting)?;
    writeln!(out, "{}", profile.placeholder)?;
    writeln!(out, "{}", HELP)?;
    out.flush()?;
    Ok(())
}

/// Next input line, or `None` on end of input or an interrupt.
async fn read_line<R>(
    lines: &mut tokio::io::Lines<R>,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    tokio::select! {
        biased;
        Some(()) = interrupts.recv() => {
            info!("Ctrl-C received at the prompt, leaving chat");
            Ok(None)
        }
        line = lines.next_line() => Ok(line?),
    }
}

/// Reads lines until a valid tradition is chosen. `None` on end of input.
async fn select_domain<R, W>(
    lines: &mut tokio::io::Lines<R>,
    out: &mut W,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> Result<Option<Domain>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    print_selection_menu(out)?;
    loop {
        write!(out, "Select 1-4: ")?;
        out.flush()?;
        let Some(line) = read_line(lines, interrupts).await? else {
            return Ok(None);
        };
        match parse_selection(&line) {
            Some(domain) => return Ok(Some(domain)),
            None => writeln!(out, "Please pick a number from 1 to 4.")?,
        }
    }
}

pub async fn run_chat<R, W>(
    input: R,
    out: &mut W,
    composer: Arc<PromptComposer>,
    client: Arc<dyn CompletionClient>,
    initial: Option<Domain>,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    let domain = match initial {
        Some(domain) => domain,
        None => match select_domain(&mut lines, out, interrupts).await? {
            Some(domain) => domain,
            None => return Ok(()),
        },
    };
    let mut session = ChatSession::new(domain, composer, client);
    print_welcome(out, domain)?;

    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = read_line(&mut lines, interrupts).await? else {
            writeln!(out)?;
            break;
        };

        match parse_command(&line) {
            Command::Quit => break,
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Home => {
                session.reset();
                match select_domain(&mut lines, out, interrupts).await? {
                    Some(domain) => {
                        session.navigate(domain);
                        print_welcome(out, domain)?;
                    }
                    None => break,
                }
            }
            Command::Switch(target) => match target.parse::<Domain>() {
                Ok(domain) => {
                    session.navigate(domain);
                    print_welcome(out, domain)?;
                }
                Err(e) => writeln!(out, "{}", e)?,
            },
            Command::Say(text) => {
                let pending = match session.submit(&text) {
                    Ok(pending) => pending,
                    Err(SessionError::EmptyInput) => continue,
                    Err(e) => {
                        writeln!(out, "{}", e)?;
                        continue;
                    }
                };
                writeln!(out, "{}", session.domain().profile().thinking)?;
                out.flush()?;

                tokio::select! {
                    biased;
                    reply = pending.resolve() => {
                        let domain = session.domain();
                        if let Some(message) = session.deliver(reply) {
                            writeln!(out, "{}", render_message(message, domain))?;
                        }
                    }
                    Some(()) = interrupts.recv() => {
                        info!("Ctrl-C received, cancelling request");
                        session.reset();
                        writeln!(out, "Request cancelled; conversation cleared.")?;
                    }
                }
            }
        }
    }

    debug!(messages = session.messages().len(), "Leaving chat");
    Ok(())
}
