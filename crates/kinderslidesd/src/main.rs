mod page;
mod presenter;
mod tracker;

use anyhow::{Context, Result};
use kinderslides_core::config::{self, Config};
use kinderslides_core::ipc::{self, ClientMsg, DaemonMsg};
use page::Page;
use presenter::ViewBroadcast;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A decoded client message plus the channel that writes back to that client.
struct ClientEvent {
    msg: ClientMsg,
    reply: mpsc::UnboundedSender<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kinderslidesd=info".parse()?),
        )
        .init();

    info!("kinderslidesd starting");

    let config = Config::load().context("loading config")?;
    info!(
        timeout_ms = config.tracker.submission_timeout_ms,
        settle_ms = config.tracker.settle_delay_ms,
        "tracker configured"
    );

    // The page is owned by this loop alone; connections only send events to it.
    let mut page = Page::new(&config, ViewBroadcast::new(&config.notice));
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ClientEvent>();

    // Start IPC listener
    let socket_path = config::socket_path();
    // Remove stale socket
    let _ = std::fs::remove_file(&socket_path);
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let listener = UnixListener::bind(&socket_path)
        .with_context(|| format!("binding socket {}", socket_path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o600)).ok();
    }
    info!(path = %socket_path.display(), "IPC socket listening");

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    tokio::spawn(handle_ipc_client(stream, event_tx.clone()));
                }
                Err(e) => {
                    warn!(error = %e, "IPC accept error");
                }
            }
        }
    });

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // Main event loop: sleeps until the tracker's next deadline, if any.
    loop {
        let deadline = page.next_deadline();
        let sleep_fut = match deadline {
            Some(dl) => tokio::time::sleep_until(tokio::time::Instant::from_std(dl)),
            None => tokio::time::sleep(Duration::from_secs(86400)),
        };
        let has_deadline = deadline.is_some();

        tokio::select! {
            Some(event) = event_rx.recv() => {
                handle_event(&mut page, event);
            }
            _ = sleep_fut, if has_deadline => {
                page.tick(Instant::now());
            }
            _ = &mut shutdown => {
                info!("interrupted");
                break;
            }
        }
    }

    info!("kinderslidesd shutting down");
    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}

fn handle_event(page: &mut Page<ViewBroadcast>, event: ClientEvent) {
    let ClientEvent { msg, reply } = event;

    let response = match msg {
        ClientMsg::RegisterView => {
            let views = page.adapter_mut().view_count() + 1;
            let _ = reply.send(ipc::encode(&DaemonMsg::Ack {
                ok: true,
                message: format!("view registered ({} connected)", views),
            }));
            let (selected, active) = (page.selected(), page.active_topic());
            page.adapter_mut().register(reply, selected, active);
            return;
        }
        ClientMsg::SelectTopic { topic } => match page.select_topic(&topic) {
            Ok(Some(selected)) => DaemonMsg::Ack {
                ok: true,
                message: format!("selected {}", selected),
            },
            Ok(None) => DaemonMsg::Ack {
                ok: true,
                message: "selection cleared".into(),
            },
            Err(e) => {
                warn!(error = %e, "selection rejected");
                DaemonMsg::Ack {
                    ok: false,
                    message: e.to_string(),
                }
            }
        },
        ClientMsg::Submit { topic } => match page.submit(&topic, Instant::now()) {
            Ok(()) => DaemonMsg::Ack {
                ok: true,
                message: format!("generating {} presentation", topic.trim()),
            },
            Err(e) => DaemonMsg::Ack {
                ok: false,
                message: e.to_string(),
            },
        },
        ClientMsg::WindowFocus => {
            page.window_focused(Instant::now());
            DaemonMsg::Ack {
                ok: true,
                message: "focus noted".into(),
            }
        }
        ClientMsg::GetStatus => page.status(env!("CARGO_PKG_VERSION")),
    };

    let _ = reply.send(ipc::encode(&response));
}

async fn handle_ipc_client(stream: UnixStream, events: mpsc::UnboundedSender<ClientEvent>) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    // Channel for sending messages back to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Writer task
    let write_handle = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    while let Ok(Some(line)) = lines.next_line().await {
        let Some(msg) = ipc::decode_client(&line) else {
            debug!(line = %line.trim(), "ignoring undecodable client line");
            continue;
        };
        let event = ClientEvent {
            msg,
            reply: tx.clone(),
        };
        if events.send(event).is_err() {
            break;
        }
    }

    // Dropping the writer closes this client's channel; a registered view
    // falls out of the broadcast on the next render.
    write_handle.abort();
}
