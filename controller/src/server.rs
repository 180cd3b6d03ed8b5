use std::net::SocketAddr;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use pistat_common::protocol::{format_set_reply, format_status, Command};
use pistat_common::{fmt_degf, ServerConfig};

use crate::state::AppState;

pub async fn bind(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.port)
        .parse()
        .with_context(|| format!("bad bind address {}:{}", config.bind_addr, config.port))?;
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind control server at {addr}"))
}

pub async fn serve(listener: TcpListener, state: AppState) {
    let mut shutdown = state.shutdown.clone();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(session(stream, peer, state.clone()));
                }
                Err(err) => warn!("accept failed: {err}"),
            },
            _ = shutdown.changed() => break,
        }
    }

    info!("control server stopped");
}

/// One line in, one reply out, until the peer sends an empty line or
/// goes away. Mode-change notifications are interleaved as their own
/// lines whenever the control loop publishes one.
async fn session(stream: TcpStream, peer: SocketAddr, state: AppState) {
    debug!("session opened by {peer}");

    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut notifications = state.notify.subscribe();
    let mut shutdown = state.shutdown.clone();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(err) => {
                        debug!("session read from {peer} failed: {err}");
                        break;
                    }
                };

                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }

                let reply = execute(line, &state).await;
                if writer.write_all(format!("{reply}\n").as_bytes()).await.is_err() {
                    break;
                }
            }
            notification = notifications.recv() => {
                // a lagged receiver just misses old notifications
                if let Ok(notification) = notification {
                    if writer
                        .write_all(format!("{notification}\n").as_bytes())
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    debug!("session closed for {peer}");
}

pub async fn execute(line: &str, state: &AppState) -> String {
    match Command::parse(line) {
        Ok(Command::Get) => {
            let shared = state.shared.lock().await;
            format_status(&shared.snapshot())
        }
        Ok(Command::Set(range)) => {
            let mut shared = state.shared.lock().await;
            shared.range = range;
            info!(
                "target range set to [{}, {}]",
                fmt_degf(range.min),
                fmt_degf(range.max)
            );
            format_set_reply(range)
        }
        Err(err) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
    use tokio::sync::watch;

    use pistat_common::TargetRange;

    use super::*;

    async fn start() -> (SocketAddr, AppState, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let range = TargetRange {
            min: 21_111,
            max: 23_888,
        };
        let state = AppState::new(range, shutdown_rx);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, state.clone()));

        (addr, state, shutdown_tx)
    }

    async fn connect(addr: SocketAddr) -> (tokio::io::Lines<BufReader<OwnedReadHalf>>, OwnedWriteHalf) {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        (BufReader::new(reader).lines(), writer)
    }

    async fn request(
        lines: &mut tokio::io::Lines<BufReader<OwnedReadHalf>>,
        writer: &mut OwnedWriteHalf,
        line: &str,
    ) -> String {
        writer.write_all(format!("{line}\n").as_bytes()).await.unwrap();
        lines.next_line().await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn set_then_get_round_trip() {
        let (addr, _state, _shutdown) = start().await;
        let (mut lines, mut writer) = connect(addr).await;

        assert_eq!(
            request(&mut lines, &mut writer, "set 18000 24000").await,
            "set target range to [64.4, 75.2]"
        );
        assert_eq!(
            request(&mut lines, &mut writer, "get").await,
            "temperature n/a to [64.4, 75.2] mode off 0x"
        );
    }

    #[tokio::test]
    async fn rejected_set_keeps_the_previous_range() {
        let (addr, _state, _shutdown) = start().await;
        let (mut lines, mut writer) = connect(addr).await;

        assert_eq!(
            request(&mut lines, &mut writer, "set abc 24000").await,
            "set: invalid minimum temperature value"
        );
        assert_eq!(
            request(&mut lines, &mut writer, "set 24000 18000").await,
            "set: minimum temperature above maximum"
        );
        assert_eq!(
            request(&mut lines, &mut writer, "get").await,
            "temperature n/a to [70.0, 75.0] mode off 0x"
        );
    }

    #[tokio::test]
    async fn unknown_commands_echo_the_token() {
        let (addr, _state, _shutdown) = start().await;
        let (mut lines, mut writer) = connect(addr).await;

        assert_eq!(
            request(&mut lines, &mut writer, "help").await,
            "unknown command: help"
        );
    }

    #[tokio::test]
    async fn empty_line_ends_only_that_session() {
        let (addr, _state, _shutdown) = start().await;
        let (mut lines_a, mut writer_a) = connect(addr).await;
        let (mut lines_b, mut writer_b) = connect(addr).await;

        // both sessions are live
        request(&mut lines_a, &mut writer_a, "get").await;
        request(&mut lines_b, &mut writer_b, "get").await;

        writer_a.write_all(b"\n").await.unwrap();
        assert_eq!(lines_a.next_line().await.unwrap(), None);

        // the other session is untouched
        assert_eq!(
            request(&mut lines_b, &mut writer_b, "get").await,
            "temperature n/a to [70.0, 75.0] mode off 0x"
        );
    }

    #[tokio::test]
    async fn notifications_fan_out_to_every_session() {
        let (addr, state, _shutdown) = start().await;
        let (mut lines_a, mut writer_a) = connect(addr).await;
        let (mut lines_b, mut writer_b) = connect(addr).await;

        // a round trip each guarantees both sessions are subscribed
        request(&mut lines_a, &mut writer_a, "get").await;
        request(&mut lines_b, &mut writer_b, "get").await;

        state.notify.send("mode heat".to_string()).unwrap();

        assert_eq!(lines_a.next_line().await.unwrap().unwrap(), "mode heat");
        assert_eq!(lines_b.next_line().await.unwrap().unwrap(), "mode heat");
    }

    #[tokio::test]
    async fn concurrent_sets_resolve_to_one_of_the_requests() {
        let (_addr, state, _shutdown) = start().await;

        let first = {
            let state = state.clone();
            tokio::spawn(async move { execute("set 18000 24000", &state).await })
        };
        let second = {
            let state = state.clone();
            tokio::spawn(async move { execute("set 20000 26000", &state).await })
        };
        first.await.unwrap();
        second.await.unwrap();

        let range = state.shared.lock().await.range;
        let outcomes = [
            TargetRange {
                min: 18_000,
                max: 24_000,
            },
            TargetRange {
                min: 20_000,
                max: 26_000,
            },
        ];
        assert!(outcomes.contains(&range));
    }

    #[tokio::test]
    async fn shutdown_stops_open_sessions() {
        let (addr, _state, shutdown) = start().await;
        let (mut lines, mut writer) = connect(addr).await;
        request(&mut lines, &mut writer, "get").await;

        shutdown.send(true).unwrap();

        // the session closes without the peer sending anything
        assert_eq!(lines.next_line().await.unwrap(), None);
    }
}
