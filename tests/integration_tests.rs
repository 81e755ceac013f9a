//! Integration tests for the CHaser server and client
//!
//! These tests run whole matches over real loopback TCP sockets.

use client::bot::Bot;
use client::network::Client;
use server::game::MatchReport;
use server::mapgen::MapGenerator;
use server::network::{HandshakeError, Server, ServerConfig, ServerError};
use server::recorder::{DumpRecorder, NullRecorder, Recorder};
use shared::{format_map, parse_map, Board, Role};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

fn loopback_config(accept_timeout: Duration) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        first_port: 0,
        second_port: 0,
        accept_timeout,
        receive_timeout: Duration::from_secs(5),
    }
}

/// Binds a server and runs its match in the background
async fn start_server(
    board: Board,
    recorder: Box<dyn Recorder>,
    config: ServerConfig,
) -> (JoinHandle<Result<MatchReport, ServerError>>, SocketAddr, SocketAddr) {
    let mut server = Server::bind(config, board, recorder).await.unwrap();
    let (hot_addr, cool_addr) = server.local_addrs().unwrap();
    let handle = tokio::spawn(async move { server.run().await });
    (handle, hot_addr, cool_addr)
}

/// Plays a full match with the bundled bot and returns the turns it acted in
async fn play_bot(addr: SocketAddr, name: &str) -> u32 {
    let mut client = Client::connect("127.0.0.1", addr.port(), name).await.unwrap();
    let mut bot = Bot::default();
    let mut turns = 0;

    loop {
        let around = client.ready().await.unwrap();
        if around.is_game_over() {
            break;
        }
        turns += 1;
        if client.act(bot.choose(&around)).await.unwrap().is_game_over() {
            break;
        }
    }

    client.disconnect().await;
    turns
}

/// Raw line-level player for scripting protocol violations
struct RawPlayer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl RawPlayer {
    async fn join(addr: SocketAddr, name: &str) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, writer) = stream.into_split();
        let mut player = Self {
            lines: BufReader::new(read).lines(),
            writer,
        };
        player.send(name).await;
        player
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn expect(&mut self) -> Option<String> {
        self.lines.next_line().await.unwrap()
    }
}

/// MATCH TESTS
mod match_tests {
    use super::*;

    /// Two bots play a generated map to the turn limit and the dump records it
    #[tokio::test]
    async fn bots_play_generated_map_to_the_end() {
        let generated = MapGenerator::with_seed(11).generate(9, 10);
        let map_source = format_map(&generated, "generated");
        let board = parse_map(&map_source).unwrap();

        let dump_path =
            std::env::temp_dir().join(format!("chaser-integration-{}.dump", std::process::id()));
        let recorder = DumpRecorder::create(&dump_path, &map_source).unwrap();

        let (server, hot_addr, cool_addr) = start_server(
            board,
            Box::new(recorder),
            loopback_config(Duration::from_secs(5)),
        )
        .await;

        let (hot_turns, cool_turns) =
            tokio::join!(play_bot(hot_addr, "hot-bot"), play_bot(cool_addr, "cool-bot"));
        let report = server.await.unwrap().unwrap();

        // The bot never walks into a wall, so both survive to the limit
        assert_eq!(report.board.turn(), 120);
        assert_eq!((hot_turns, cool_turns), (120, 120));
        assert!(report.board.character(Role::Hot).alive);
        assert!(report.board.character(Role::Cool).alive);
        assert_eq!(report.result, report.board.result());

        let dump = std::fs::read_to_string(&dump_path).unwrap();
        std::fs::remove_file(&dump_path).unwrap();

        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "hot-bot,cool-bot");
        assert_eq!(lines[1], "generated");
        assert_eq!(lines[lines.len() - 2], "gameend");

        let last = lines[lines.len() - 1];
        match report.winner_name() {
            Some(name) => assert!(last.starts_with(&format!("{},win,", name))),
            None => assert_eq!(last, "draw,draw,draw"),
        }
    }

    /// A malformed command ends the match immediately in the opponent's favour
    #[tokio::test]
    async fn malformed_action_loses_the_match() {
        let board = parse_map("T 120\nS 5,5\nD 1,1,3\nH 0,0\nC 4,4\n").unwrap();
        let (server, hot_addr, cool_addr) = start_server(
            board,
            Box::new(NullRecorder),
            loopback_config(Duration::from_secs(5)),
        )
        .await;

        let mut hot = RawPlayer::join(hot_addr, "hot").await;
        let mut cool = RawPlayer::join(cool_addr, "cool").await;

        assert_eq!(hot.expect().await.as_deref(), Some("Ready"));
        hot.send("gr").await;
        assert_eq!(hot.expect().await.as_deref(), Some("1222200203"));
        hot.send("wk").await;

        assert_eq!(hot.expect().await.as_deref(), Some("#"));
        assert_eq!(cool.expect().await.as_deref(), Some("#"));
        assert_eq!(hot.expect().await, None);
        assert_eq!(cool.expect().await, None);

        let report = server.await.unwrap().unwrap();
        assert_eq!(report.result.winner, Some(Role::Cool));
        assert_eq!(report.result.reason, "hot died");
        assert_eq!(report.winner_name(), Some("cool"));
        assert_eq!(report.board.turn(), 0);
    }

    /// Cool moves first on odd turns and sees walls Hot placed earlier
    #[tokio::test]
    async fn turn_order_alternates() {
        let board = parse_map("T 2\nS 3,3\nH 0,0\nC 2,2\n").unwrap();
        let (server, hot_addr, cool_addr) = start_server(
            board,
            Box::new(NullRecorder),
            loopback_config(Duration::from_secs(5)),
        )
        .await;

        let mut hot = RawPlayer::join(hot_addr, "hot").await;
        let mut cool = RawPlayer::join(cool_addr, "cool").await;

        // Turn 0: Hot, then Cool
        assert_eq!(hot.expect().await.as_deref(), Some("Ready"));
        hot.send("gr").await;
        hot.expect().await;
        hot.send("pt 3").await;
        assert_eq!(hot.expect().await.as_deref(), Some("1222202200"));
        hot.send("#").await;

        assert_eq!(cool.expect().await.as_deref(), Some("Ready"));
        cool.send("gr").await;
        cool.expect().await;
        cool.send("sc 0").await;
        assert_eq!(cool.expect().await.as_deref(), Some("1002222222"));
        cool.send("#").await;

        // Turn 1: Cool leads
        assert_eq!(cool.expect().await.as_deref(), Some("Ready"));
        cool.send("gr").await;
        cool.expect().await;
        cool.send("lk 2").await;
        assert_eq!(cool.expect().await.as_deref(), Some("1000000000"));
        cool.send("#").await;

        assert_eq!(hot.expect().await.as_deref(), Some("Ready"));
        hot.send("gr").await;
        hot.expect().await;
        hot.send("sc 3").await;
        assert_eq!(hot.expect().await.as_deref(), Some("1202222222"));
        hot.send("#").await;

        assert_eq!(hot.expect().await.as_deref(), Some("#"));
        assert_eq!(cool.expect().await.as_deref(), Some("#"));

        let report = server.await.unwrap().unwrap();
        assert!(report.result.is_draw());
        assert_eq!(report.board.turn(), 2);
    }
}

/// HANDSHAKE TESTS
mod handshake_tests {
    use super::*;

    /// A missing second player aborts the match and drops the first one
    #[tokio::test]
    async fn accept_timeout_aborts_the_match() {
        let board = parse_map("T 120\nS 3,3\nH 0,0\nC 2,2\n").unwrap();
        let (server, hot_addr, _) = start_server(
            board,
            Box::new(NullRecorder),
            loopback_config(Duration::from_millis(200)),
        )
        .await;

        let mut hot = RawPlayer::join(hot_addr, "lonely").await;

        let err = server.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            ServerError::Handshake {
                role: Role::Cool,
                source: HandshakeError::AcceptTimeout(_)
            }
        ));
        assert_eq!(hot.expect().await, None);
    }
}
