use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kinderslides_core::config;
use kinderslides_core::ipc::{self, ClientMsg, DaemonMsg, Phase};
use kinderslides_core::topics::Topic;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

#[derive(Parser)]
#[command(name = "kinderslidesctl", about = "Drive the kinderslidesd page controller")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show tracker status
    Status,
    /// List the topics a deck can be generated for
    Topics,
    /// Change the topic selector (empty string clears it)
    Select {
        topic: String,
    },
    /// Submit the form
    Submit {
        /// Selector value to submit with; omit to submit with nothing selected
        #[arg(default_value = "")]
        topic: String,
    },
    /// Report that the page's window regained focus
    Focus,
    /// Register as a view and print render instructions as they arrive
    Watch {
        /// Print raw JSON lines instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let msg: ClientMsg = match cli.command {
        Command::Topics => {
            print_topics();
            return Ok(());
        }
        Command::Watch { json } => return watch(json),
        Command::Status => ClientMsg::GetStatus,
        Command::Select { topic } => ClientMsg::SelectTopic { topic },
        Command::Submit { topic } => ClientMsg::Submit { topic },
        Command::Focus => ClientMsg::WindowFocus,
    };

    let (mut writer, reader) = connect()?;
    let line = ipc::encode(&msg);
    writer
        .write_all(line.as_bytes())
        .context("sending command")?;

    // Read response
    for line in reader.lines() {
        let line = line.context("reading response")?;
        if let Some(resp) = ipc::decode_daemon(&line) {
            match resp {
                DaemonMsg::Status {
                    phase,
                    active_topic,
                    selected,
                    last_outcome,
                    version,
                } => {
                    println!("kinderslidesd v{}", version);
                    match (phase, active_topic) {
                        (Phase::Armed, Some(topic)) => println!("  phase:    armed ({})", topic),
                        (Phase::Armed, None) => println!("  phase:    armed"),
                        (Phase::Idle, _) => println!("  phase:    idle"),
                    }
                    println!("  selected: {}", selected.map(|t| t.label()).unwrap_or("-"));
                    match last_outcome {
                        Some(outcome) => println!("  last:     {:?}", outcome),
                        None => println!("  last:     -"),
                    }
                }
                DaemonMsg::Ack { ok, message } => {
                    if ok {
                        println!("{}", message);
                    } else {
                        eprintln!("error: {}", message);
                        std::process::exit(1);
                    }
                }
                _ => continue,
            }
            break;
        }
    }

    Ok(())
}

fn connect() -> Result<(UnixStream, BufReader<UnixStream>)> {
    let socket_path = config::socket_path();
    let stream = UnixStream::connect(&socket_path).with_context(|| {
        format!(
            "connecting to kinderslidesd at {}\nIs the daemon running?",
            socket_path.display()
        )
    })?;
    let writer = stream.try_clone().context("cloning stream")?;
    Ok((writer, BufReader::new(stream)))
}

fn print_topics() {
    for topic in Topic::ALL {
        println!(
            "{:<12} {:>2} slides  {}",
            topic.label(),
            topic.slide_count(),
            topic.description()
        );
    }
}

fn watch(json: bool) -> Result<()> {
    let (mut writer, reader) = connect()?;
    writer
        .write_all(ipc::encode(&ClientMsg::RegisterView).as_bytes())
        .context("sending register")?;

    for line in reader.lines() {
        let line = line.context("reading render instruction")?;
        let Some(msg) = ipc::decode_daemon(&line) else {
            continue;
        };
        if json {
            println!("{}", serde_json::to_string(&msg).context("re-encoding message")?);
            continue;
        }
        match msg {
            DaemonMsg::Controls { label, enabled, pulse } => {
                let state = if enabled { "enabled" } else { "disabled" };
                let pulse = if pulse { ", pulsing" } else { "" };
                println!("[button] {} ({}{})", label, state, pulse);
            }
            DaemonMsg::Modal { visible } => {
                println!("[modal]  {}", if visible { "shown" } else { "hidden" });
            }
            DaemonMsg::Notice { level, message, dismiss_after_ms, .. } => {
                println!("[{:?}] {} (for {}ms)", level, message, dismiss_after_ms);
            }
            DaemonMsg::TopicInfo { topic, description, .. } => {
                println!("[topic]  {}: {}", topic, description);
            }
            DaemonMsg::ClearTopicInfo => println!("[topic]  -"),
            DaemonMsg::Ack { ok: false, message } => eprintln!("error: {}", message),
            DaemonMsg::Ack { .. } | DaemonMsg::Status { .. } => {}
        }
    }

    Ok(())
}
