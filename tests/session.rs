use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use chess_arena::{
    clock::ChessClock,
    game_session::GameSession,
    move_invoker::MoveInvoker,
    prelude::*,
    time_source::{ManualTime, TimeSource},
};

use crate::games::*;

mod games;

const MINUTE: TimeControl = TimeControl::Fixed(Duration::from_secs(60));

fn session(white: BoxedAgent, black: BoxedAgent, stones: u32) -> GameSession<TakeAway> {
    GameSession::new(rules(), white, black, Pile::new(stones), MINUTE, MINUTE)
}

fn simulated_session(
    white: BoxedAgent,
    black: BoxedAgent,
    stones: u32,
    control: TimeControl,
    time: &Arc<ManualTime>,
) -> GameSession<TakeAway> {
    let time: Arc<dyn TimeSource> = time.clone();
    GameSession::with_clocks(
        rules(),
        white,
        black,
        Pile::new(stones),
        ChessClock::with_time_source(control, time.clone()),
        ChessClock::with_time_source(control, time),
    )
}

#[test]
fn plays_to_checkmate() {
    // W B W B W: white takes the last stone
    let mut game = session(Box::new(TakeOne), Box::new(TakeOne), 5);
    assert_eq!(game.run().unwrap(), GameResult::WhiteWins);
    assert_eq!(game.moves(), &[1, 1, 1, 1, 1]);
    assert_eq!(game.position().stones, 0);

    let mut game = session(Box::new(TakeOne), Box::new(TakeOne), 4);
    assert_eq!(game.run().unwrap(), GameResult::BlackWins);
}

#[test]
fn draw_comes_from_the_rules() {
    let rules = Arc::new(TakeAway { max_plies: 4 });
    let mut game = GameSession::new(
        rules,
        Box::new(TakeOne),
        Box::new(TakeOne),
        Pile::new(100),
        MINUTE,
        MINUTE,
    );
    assert_eq!(
        game.run().unwrap(),
        GameResult::Draw(DrawReason::FiftyMoveRule)
    );
    assert_eq!(game.moves().len(), 4);
}

#[test]
fn illegal_move_is_charged_to_the_mover() {
    // only 1..=3 stones can be taken
    let mut game = session(Box::new(Scripted(vec![Some(4)])), Box::new(TakeOne), 10);
    assert_eq!(game.run().unwrap(), GameResult::WhiteIllegalMove);
    assert!(game.moves().is_empty());

    let mut game = session(Box::new(TakeOne), Box::new(Scripted(vec![Some(0)])), 10);
    assert_eq!(game.run().unwrap(), GameResult::BlackIllegalMove);
    assert_eq!(game.moves(), &[1]);

    // more stones than left
    let mut game = session(
        Box::new(Scripted(vec![Some(1), Some(3)])),
        Box::new(TakeOne),
        4,
    );
    assert_eq!(game.run().unwrap(), GameResult::WhiteIllegalMove);
}

#[test]
fn no_move_is_a_forfeit() {
    let mut game = session(Box::new(Scripted(vec![])), Box::new(TakeOne), 5);
    assert_eq!(game.run().unwrap(), GameResult::WhiteIllegalMove);

    let mut game = session(Box::new(TakeOne), Box::new(Scripted(vec![Some(1), None])), 9);
    assert_eq!(game.run().unwrap(), GameResult::BlackIllegalMove);
    assert_eq!(game.moves().len(), 3);
}

#[test]
fn move_after_flag_fall_is_a_timeout() {
    let time = Arc::new(ManualTime::new());
    let slow = SimulatedThinker {
        time: time.clone(),
        think: Duration::from_secs(61),
    };
    let mut game = simulated_session(Box::new(slow), Box::new(TakeOne), 5, MINUTE, &time);
    assert_eq!(game.run().unwrap(), GameResult::WhiteTimeout);
    assert!(game.clock(Color::White).is_timed_out());
    assert!(!game.clock(Color::Black).is_timed_out());

    let white = AgentId::from("white");
    let black = AgentId::from("black");
    let mut ledger = ResultLedger::new();
    ledger
        .record_outcome(&white, &black, GameResult::WhiteTimeout)
        .unwrap();
    let record = ledger.get(&white, &black).unwrap();
    assert_eq!(record.tally(&black).unwrap().wins_as_black, 1);
    assert_eq!(record.tally(&black).unwrap().wins_as_white, 0);
    assert_eq!(record.tally(&white).unwrap().total_wins(), 0);
    assert_eq!(record.total_draws(), 0);
}

#[test]
fn black_timeout_is_attributed_to_black() {
    let time = Arc::new(ManualTime::new());
    let slow = SimulatedThinker {
        time: time.clone(),
        think: Duration::from_secs(61),
    };
    let mut game = simulated_session(Box::new(TakeOne), Box::new(slow), 5, MINUTE, &time);
    assert_eq!(game.run().unwrap(), GameResult::BlackTimeout);
    assert_eq!(game.moves(), &[1]);
}

#[test]
fn clock_variants_change_who_flags() {
    let thinker = |time: &Arc<ManualTime>| -> BoxedAgent {
        Box::new(SimulatedThinker {
            time: time.clone(),
            think: Duration::from_secs(1),
        })
    };
    // 10 stones taken one at a time: black takes the last one unless white flags first
    let controls = [
        (TimeControl::Fixed(Duration::from_secs(2)), GameResult::WhiteTimeout),
        (
            TimeControl::Incremental {
                time: Duration::from_secs(2),
                increment: Duration::from_secs(1),
            },
            GameResult::BlackWins,
        ),
        (
            TimeControl::Delay {
                time: Duration::from_millis(500),
                delay: Duration::from_secs(1),
            },
            GameResult::BlackWins,
        ),
        (TimeControl::Infinite, GameResult::BlackWins),
    ];
    for (control, expected) in controls {
        let time = Arc::new(ManualTime::new());
        let mut game =
            simulated_session(thinker(&time), Box::new(TakeOne), 10, control, &time);
        assert_eq!(game.run().unwrap(), expected, "{control}");
    }
}

#[test]
fn overstaying_agent_is_abandoned() {
    let control = TimeControl::Fixed(Duration::from_millis(50));
    let mut game = GameSession::new(
        rules(),
        Box::new(Sleepy(Duration::from_secs(3))),
        Box::new(TakeOne),
        Pile::new(5),
        control,
        control,
    )
    .with_invoker(MoveInvoker::new(Duration::from_millis(50), "abandon"));

    let start = Instant::now();
    assert_eq!(game.run().unwrap(), GameResult::WhiteTimeout);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn agent_receives_timing_context() {
    let timers = Arc::new(Mutex::new(vec![]));
    let white_control = TimeControl::Incremental {
        time: Duration::from_secs(30),
        increment: Duration::from_secs(2),
    };
    let mut game = GameSession::new(
        rules(),
        Box::new(TimerProbe(timers.clone())),
        Box::new(TakeOne),
        Pile::new(3),
        white_control,
        TimeControl::Infinite,
    );
    assert_eq!(game.run().unwrap(), GameResult::WhiteWins);

    let timers = timers.lock().unwrap();
    assert_eq!(timers.len(), 2);
    assert_eq!(timers[0].remaining, Duration::from_secs(30));
    assert_eq!(timers[0].starting, Duration::from_secs(30));
    assert_eq!(timers[0].increment, Duration::from_secs(2));
    assert_eq!(timers[0].opponent_remaining, Duration::MAX);
    // the increment was earned on the first move
    assert!(timers[1].remaining > Duration::from_secs(31));
}

#[test]
fn cancelled_session_stops_before_next_turn() {
    let mut game = session(Box::new(TakeOne), Box::new(TakeOne), 5);
    let token = game.cancellation_token();
    token.cancel();
    let err = game.run().unwrap_err();
    assert!(err.downcast_ref::<Cancelled>().is_some());
    assert!(game.moves().is_empty());
}

#[test]
fn crashing_agent_fails_only_its_session() {
    let mut game = session(Box::new(Panicky), Box::new(TakeOne), 5);
    let err = game.run().unwrap_err();
    assert!(err.downcast_ref::<Cancelled>().is_none());

    let mut other = session(Box::new(TakeOne), Box::new(TakeOne), 5);
    assert_eq!(other.run().unwrap(), GameResult::WhiteWins);
}
