use anyhow::{bail, Result};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tickirc::config::{self, AppConfig};
use tickirc::logging::{self, EntryKind, Transcript};
use tickirc::{Event, EventKind, IrcClient};
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let cfg = config::load_config(config_path.as_deref())?;

    logging::init_tracing(&cfg.logging.level);

    if let Err(e) = run(cfg).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cfg: AppConfig) -> Result<()> {
    let server = &cfg.server;
    let mut client: IrcClient = IrcClient::new().with_max_line_len(cfg.client.max_line_len);

    if !client.connect(&server.host, server.port) {
        bail!("could not connect to {}:{}", server.host, server.port);
    }

    register_callbacks(&mut client, &cfg);

    client.nick(&server.nickname)?;
    client.user(server.username(), server.realname())?;

    let mut interval = tokio::time::interval(Duration::from_millis(cfg.client.tick_interval_ms.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // Drain whatever is buffered before yielding again.
                while client.tick() > 0 {}
                if !client.is_connected() {
                    info!("connection closed");
                    break;
                }
            }
            _ = &mut ctrl_c => {
                info!("interrupted, quitting");
                if let Err(e) = client.quit(&server.quit_message) {
                    warn!(error = %e, "failed to send QUIT");
                }
                client.disconnect();
                break;
            }
        }
    }

    Ok(())
}

fn register_callbacks(client: &mut IrcClient, cfg: &AppConfig) {
    let channels = cfg.server.channels.clone();
    client.register(EventKind::Connected, move |_, ctx| {
        info!("registered with server");
        for channel in &channels {
            ctx.join(channel);
        }
    });

    client.register(EventKind::Join, |event, _| {
        if let Event::Join { source, channel } = event {
            info!(%source, %channel, "join");
        }
    });

    client.register(EventKind::Part, |event, _| {
        if let Event::Part { source, channel, reason } = event {
            info!(%source, %channel, %reason, "part");
        }
    });

    client.register(EventKind::Kick, |event, _| {
        if let Event::Kick { source, channel, target } = event {
            info!(%source, %channel, kicked = target.unwrap_or_default(), "kick");
        }
    });

    client.register(EventKind::Quit, |event, _| {
        if let Event::Quit { nick, reason } = event {
            info!(%nick, %reason, "quit");
        }
    });

    client.register(EventKind::NickChange, |event, _| {
        if let Event::NickChange { source, new_nick } = event {
            info!(%source, %new_nick, "nick change");
        }
    });

    let transcript = Rc::new(RefCell::new(Transcript::new(&cfg.logging)));

    let privmsgs = Rc::clone(&transcript);
    client.register(EventKind::Privmsg, move |event, _| {
        if let Event::Privmsg { source, target, message } = event {
            info!(%source, %target, "{}", message);
            privmsgs
                .borrow_mut()
                .record(EntryKind::Privmsg, target, tickirc::source_nick(source), message);
        }
    });

    let notices = Rc::clone(&transcript);
    client.register(EventKind::Notice, move |event, _| {
        if let Event::Notice { source, target, message } = event {
            info!(%source, %target, "-{}- {}", tickirc::source_nick(source), message);
            notices
                .borrow_mut()
                .record(EntryKind::Notice, target, tickirc::source_nick(source), message);
        }
    });
}
