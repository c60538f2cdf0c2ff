//! Live session event loop
//!
//! One tokio current-thread task drives the controller. It selects between the
//! next inbound feed line, the next timer deadline and the shutdown signal, and
//! every wake-up is a single synchronous callback into the controller.

use anyhow::Result;
use std::borrow::Cow;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::commands::CommandSink;
use crate::config::EndBroodConfig;
use crate::controller::Controller;
use crate::feed::{decode_frame, InboundFrame};
use crate::status::{FeedSnapshot, StatusResolver};
use crate::warp_list::WarpListStore;

/// Controller plus the snapshot handle inbound frames are written into
pub struct Session {
    controller: Controller,
    snapshot: FeedSnapshot,
}

impl Session {
    pub fn new(config: &EndBroodConfig, sink: Box<dyn CommandSink>) -> Self {
        let snapshot = FeedSnapshot::new();
        let controller = Controller::new(
            config.timings(),
            StatusResolver::new(Box::new(snapshot.clone())),
            WarpListStore::open(config.storage.warp_lists_path.clone()),
            sink,
        );
        Self {
            controller,
            snapshot,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    /// Decode and dispatch one feed line. Malformed lines are skipped.
    pub fn handle_line(&mut self, line: &str) {
        match decode_frame(line) {
            Ok(Some(frame)) => self.handle_frame(frame),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Skipping malformed feed frame"),
        }
    }

    pub fn handle_frame(&mut self, frame: InboundFrame) {
        match frame {
            InboundFrame::Scoreboard { lines } => self.snapshot.update_scoreboard(lines),
            InboundFrame::TabList { names } => self.snapshot.update_tab_list(names),
            InboundFrame::Chat { message } => self.controller.handle_chat(&message),
            InboundFrame::Command { line } => {
                debug!(line = %line, "Operator command");
                self.controller.handle_command_line(&line);
            }
        }
    }
}

/// Drive `session` until the feed closes or `shutdown` resolves.
///
/// The controller's virtual clock is kept in step with tokio time, measured
/// from the moment the loop starts. On exit the controller is shut down, which
/// disbands any party still formed.
pub async fn run<R, S>(session: &mut Session, input: R, shutdown: S) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let start = Instant::now();
    let mut segments = input.split(b'\n');
    tokio::pin!(shutdown);

    info!("Session started");

    let result = loop {
        let deadline = session.controller().next_deadline().map(|at| start + at);

        tokio::select! {
            segment = segments.next_segment() => match segment {
                Ok(Some(bytes)) => {
                    session.controller_mut().advance_to(start.elapsed());
                    session.handle_line(&decode_line(&bytes));
                }
                Ok(None) => {
                    info!("Feed closed");
                    break Ok(());
                }
                Err(e) => break Err(e.into()),
            },
            _ = wait_until(deadline) => {
                session.controller_mut().advance_to(start.elapsed());
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break Ok(());
            }
        }
    };

    session.controller_mut().shutdown();
    result
}

/// Invalid UTF-8 is replaced rather than treated as a read error.
fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    let line = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = line {
        warn!(len = bytes.len(), "Feed line is not valid UTF-8");
    }
    line
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Resolves on ctrl-c. If the handler cannot be installed, never resolves.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedWriter;
    use crate::status::Entity;
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::{AsyncWriteExt, BufReader};

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.borrow())
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn session(dir: &TempDir, out: &SharedBuf) -> Session {
        let mut config = EndBroodConfig::default();
        config.storage.warp_lists_path = dir.path().join("warp_lists.json");
        Session::new(&config, Box::new(FeedWriter::new(out.clone())))
    }

    #[test]
    fn test_frames_reach_controller() {
        let dir = TempDir::new().unwrap();
        let out = SharedBuf::default();
        let mut session = session(&dir, &out);

        session.handle_line(r#"{"type":"command","line":"/warpadd prot Steve"}"#);
        session.handle_line("garbage");
        session.handle_line(r#"{"type":"scoreboard","lines":["§4Protector§7:🎁§7 Awakening"]}"#);
        session.handle_line(r#"{"type":"command","line":"/cycle"}"#);

        let state = session.controller().entity_state(Entity::Protector);
        assert!(state.is_pending());
        let lines = out.lines();
        assert_eq!(
            lines[0],
            r#"{"type":"chat","message":"Added Steve to protector warp list"}"#
        );
        assert!(lines.contains(&r#"{"type":"chat","message":"Protector: Awakening"}"#.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_drives_party_sequence_on_tokio_time() {
        let dir = TempDir::new().unwrap();
        let out = SharedBuf::default();
        let mut session = session(&dir, &out);
        session.handle_line(r#"{"type":"command","line":"/warpadd brood a"}"#);

        let (mut client, server) = tokio::io::duplex(4096);
        client
            .write_all(
                concat!(
                    r#"{"type":"scoreboard","lines":["§4Broodmother§7:🎁§7 Alive"]}"#,
                    "\n",
                    r#"{"type":"command","line":"/cycle"}"#,
                    "\n"
                )
                .as_bytes(),
            )
            .await
            .unwrap();

        run(
            &mut session,
            BufReader::new(server),
            tokio::time::sleep(Duration::from_secs(12)),
        )
        .await
        .unwrap();

        let commands: Vec<String> = out
            .lines()
            .into_iter()
            .filter(|l| l.contains(r#""type":"command""#))
            .collect();
        assert_eq!(
            &commands[..3],
            &[
                r#"{"type":"command","command":"p a"}"#.to_string(),
                r#"{"type":"command","command":"p warp"}"#.to_string(),
                r#"{"type":"command","command":"p disband"}"#.to_string(),
            ]
        );
        assert!(!session.controller().is_enabled());
        drop(client);
    }

    #[tokio::test]
    async fn test_run_stops_when_feed_closes() {
        let dir = TempDir::new().unwrap();
        let out = SharedBuf::default();
        let mut session = session(&dir, &out);

        let input = BufReader::new(&b"{\"type\":\"command\",\"line\":\"/cycle\"}\n"[..]);
        run(&mut session, input, std::future::pending::<()>()).await.unwrap();

        // Shutdown on exit turns cycling back off
        assert!(!session.controller().is_enabled());
        assert!(session.controller().scheduler().count(crate::scheduler::Timer::Poll) == 0);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_session() {
        let dir = TempDir::new().unwrap();
        let out = SharedBuf::default();
        let mut session = session(&dir, &out);

        let mut feed = Vec::new();
        feed.extend_from_slice(b"{\"type\":\"command\",\"line\":\"/cycle\"}\n");
        feed.extend_from_slice(b"{\"type\":\"chat\",\"message\":\"\xff\xfe\"}\n");
        feed.extend_from_slice(b"{\"type\":\"command\",\"line\":\"/warpadd brood After\"}\n");

        run(&mut session, BufReader::new(&feed[..]), std::future::pending::<()>())
            .await
            .unwrap();

        assert!(out
            .lines()
            .contains(&r#"{"type":"chat","message":"Added After to broodmother warp list"}"#.to_string()));
        assert_eq!(
            session.controller().store().load().broodmother.players,
            vec!["After".to_string()]
        );
    }

    #[test]
    fn test_decode_line_replaces_invalid_bytes() {
        assert_eq!(decode_line(b"plain"), "plain");
        assert_eq!(decode_line(b"a\xffb"), "a\u{FFFD}b");
    }
}
