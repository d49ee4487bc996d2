use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use z21_conn::{ConnError, ConnOptions, Connection};
use z21_message::{HwInfo, Message, SerialNumber, Stop, TrackPower};
use z21_transport::{DatagramTransport, MemoryTransport};

const HWINFO_REQUEST: [u8; 4] = [0x04, 0x00, 0x1A, 0x00];
const SERIAL_REQUEST: [u8; 4] = [0x04, 0x00, 0x10, 0x00];
const HWINFO_REPLY: [u8; 12] = [
    0x0C, 0x00, 0x1A, 0x00, 0x00, 0x02, 0x00, 0x00, 0x05, 0x01, 0x00, 0x00,
];
const POWER_ON_BROADCAST: [u8; 7] = [0x07, 0x00, 0x40, 0x00, 0x61, 0x01, 0x60];
const POWER_OFF_BROADCAST: [u8; 7] = [0x07, 0x00, 0x40, 0x00, 0x61, 0x00, 0x61];
const STOPPED_BROADCAST: [u8; 7] = [0x07, 0x00, 0x40, 0x00, 0x81, 0x00, 0x81];

fn serial_reply(serial: u32) -> Vec<u8> {
    let mut reply = vec![0x08, 0x00, 0x10, 0x00];
    reply.extend_from_slice(&serial.to_le_bytes());
    reply
}

/// Scripted command station on the far end of a memory transport.
struct Station {
    end: MemoryTransport,
}

impl Station {
    async fn next_request(&self) -> Vec<u8> {
        let mut buf = [0u8; 64];
        let n = self.end.recv(&mut buf).await.expect("station should receive");
        buf[..n].to_vec()
    }

    async fn reply(&self, datagram: &[u8]) {
        self.end.send(datagram).await.expect("station should send");
    }
}

fn open(options: ConnOptions) -> (Connection, Station) {
    let (client, station) = MemoryTransport::pair();
    let conn = Connection::with_transport(Arc::new(client), options);
    (conn, Station { end: station })
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_get_their_own_replies() {
    let (conn, station) = open(ConnOptions::default());

    let hw = tokio::spawn({
        let conn = conn.clone();
        async move { conn.hardware_info().await }
    });
    let sn = tokio::spawn({
        let conn = conn.clone();
        async move { conn.serial_number().await }
    });

    let mut requests = vec![station.next_request().await, station.next_request().await];
    requests.sort();
    assert_eq!(requests, vec![SERIAL_REQUEST.to_vec(), HWINFO_REQUEST.to_vec()]);

    // Answer in the opposite order of arrival.
    station.reply(&serial_reply(4242)).await;
    station.reply(&HWINFO_REPLY).await;

    let info = hw.await.unwrap().expect("hwinfo should succeed");
    assert_eq!(info.hardware.to_string(), "black Z21 (2012)");
    assert_eq!(info.firmware.map(|f| f.to_string()).as_deref(), Some("1.5"));
    assert_eq!(sn.await.unwrap().expect("serial should succeed").serial, 4242);
    assert_eq!(conn.pending_requests(), 0);
    assert_eq!(conn.events().try_recv(), None);
}

#[tokio::test(start_paused = true)]
async fn unanswered_request_times_out_and_key_is_removed() {
    let (conn, station) = open(ConnOptions::default().with_timeout(Duration::from_millis(200)));
    let key = Message::from(HwInfo::default()).key().unwrap();

    let err = conn.hardware_info().await.unwrap_err();
    assert!(matches!(err, ConnError::Timeout(d) if d == Duration::from_millis(200)));
    assert!(!conn.is_pending(&key));
    assert_eq!(station.next_request().await, HWINFO_REQUEST.to_vec());
}

#[tokio::test(start_paused = true)]
async fn reply_after_timeout_goes_to_events() {
    let (conn, station) = open(ConnOptions::default().with_timeout(Duration::from_millis(100)));

    assert!(matches!(
        conn.hardware_info().await,
        Err(ConnError::Timeout(_))
    ));
    station.reply(&HWINFO_REPLY).await;

    let event = conn.events().recv().await.expect("late reply should be an event");
    assert!(matches!(event, Message::HwInfo(_)));
}

#[tokio::test(start_paused = true)]
async fn caller_deadline_withdraws_request() {
    let (conn, station) = open(ConnOptions::default().with_timeout(Duration::from_secs(5)));

    let err = conn
        .send_and_wait(&HwInfo::default().into(), Duration::from_millis(10))
        .await
        .unwrap_err();
    assert!(matches!(err, ConnError::DeadlineElapsed(d) if d == Duration::from_millis(10)));
    assert_eq!(conn.pending_requests(), 0);

    station.reply(&HWINFO_REPLY).await;
    let event = conn.events().recv().await.expect("late reply should be an event");
    assert!(matches!(event, Message::HwInfo(_)));
}

#[tokio::test(start_paused = true)]
async fn dropping_the_wait_withdraws_request() {
    let (conn, station) = open(ConnOptions::default());

    let waiter = tokio::spawn({
        let conn = conn.clone();
        async move { conn.hardware_info().await }
    });
    assert_eq!(station.next_request().await, HWINFO_REQUEST.to_vec());
    assert_eq!(conn.pending_requests(), 1);

    waiter.abort();
    assert!(waiter.await.unwrap_err().is_cancelled());
    assert_eq!(conn.pending_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn same_kind_requests_are_served_in_order() {
    let (conn, station) = open(ConnOptions::default());

    let first = tokio::spawn({
        let conn = conn.clone();
        async move { conn.serial_number().await }
    });
    station.next_request().await;
    let second = tokio::spawn({
        let conn = conn.clone();
        async move { conn.serial_number().await }
    });
    station.next_request().await;
    assert_eq!(conn.pending_requests(), 2);

    station.reply(&serial_reply(1)).await;
    station.reply(&serial_reply(2)).await;

    assert_eq!(first.await.unwrap().unwrap(), SerialNumber { serial: 1 });
    assert_eq!(second.await.unwrap().unwrap(), SerialNumber { serial: 2 });
}

#[tokio::test(start_paused = true)]
async fn power_state_is_part_of_the_correlation() {
    let (conn, station) = open(ConnOptions::default());

    let power_on = tokio::spawn({
        let conn = conn.clone();
        async move { conn.track_power(true).await }
    });
    assert_eq!(
        station.next_request().await,
        vec![0x07, 0x00, 0x40, 0x00, 0x21, 0x81, 0xA0]
    );

    // An "off" broadcast does not satisfy a pending "on" request.
    station.reply(&POWER_OFF_BROADCAST).await;
    assert_eq!(
        conn.events().recv().await,
        Some(TrackPower { on: false }.into())
    );
    assert_eq!(conn.pending_requests(), 1);

    station.reply(&POWER_ON_BROADCAST).await;
    assert_eq!(power_on.await.unwrap().unwrap(), TrackPower { on: true });
}

#[tokio::test(start_paused = true)]
async fn stop_waits_for_stopped_broadcast() {
    let (conn, station) = open(ConnOptions::default());

    let stop = tokio::spawn({
        let conn = conn.clone();
        async move { conn.stop().await }
    });
    assert_eq!(
        station.next_request().await,
        vec![0x06, 0x00, 0x40, 0x00, 0x80, 0x80]
    );
    station.reply(&STOPPED_BROADCAST).await;
    assert_eq!(stop.await.unwrap().unwrap(), Stop);
}

#[tokio::test(start_paused = true)]
async fn close_fails_waiters_and_later_sends() {
    let (conn, station) = open(ConnOptions::default());

    let waiter = tokio::spawn({
        let conn = conn.clone();
        async move { conn.hardware_info().await }
    });
    station.next_request().await;

    conn.close();
    assert!(matches!(waiter.await.unwrap(), Err(ConnError::Closed)));
    assert!(matches!(
        conn.send(&Stop.into()).await,
        Err(ConnError::NotConnected)
    ));
    assert_eq!(conn.events().recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn close_lets_go_of_the_transport_while_clones_live() {
    let (conn, station) = open(ConnOptions::default());
    let other = conn.clone();

    conn.close();

    // The client end is dropped, so the station sees its peer go away.
    let mut buf = [0u8; 8];
    let err = station.end.recv(&mut buf).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionAborted);
    assert!(matches!(
        other.request(&HwInfo::default().into()).await,
        Err(ConnError::NotConnected)
    ));
}

#[tokio::test(start_paused = true)]
async fn broadcasts_arrive_in_order_including_multi_frame_datagrams() {
    let (conn, station) = open(ConnOptions::default());
    let events = conn.events();

    let mut datagram = POWER_OFF_BROADCAST.to_vec();
    datagram.extend_from_slice(&STOPPED_BROADCAST);
    station.reply(&datagram).await;
    station.reply(&POWER_ON_BROADCAST).await;

    assert_eq!(events.recv().await, Some(TrackPower { on: false }.into()));
    assert_eq!(events.recv().await, Some(Stop.into()));
    assert_eq!(events.recv().await, Some(TrackPower { on: true }.into()));
}

#[tokio::test(start_paused = true)]
async fn full_event_stream_drops_newest() {
    let (conn, station) = open(ConnOptions::default().with_event_capacity(2));

    station.reply(&POWER_OFF_BROADCAST).await;
    station.reply(&STOPPED_BROADCAST).await;
    station.reply(&POWER_ON_BROADCAST).await;
    wait_until(|| conn.dropped_events() == 1).await;

    let events = conn.events();
    assert_eq!(events.try_recv(), Some(TrackPower { on: false }.into()));
    assert_eq!(events.try_recv(), Some(Stop.into()));
    assert_eq!(events.try_recv(), None);
}

#[tokio::test(start_paused = true)]
async fn undecodable_frames_do_not_stop_the_loop() {
    let (conn, station) = open(ConnOptions::default());

    station.reply(&[0x05, 0x00, 0x99, 0x00, 0x00]).await;
    station.reply(&[0x02, 0x00]).await;
    station.reply(&POWER_ON_BROADCAST).await;

    assert_eq!(
        conn.events().recv().await,
        Some(TrackPower { on: true }.into())
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_last_handle_closes() {
    let (conn, _station) = open(ConnOptions::default());
    let events = conn.events();
    drop(conn);
    assert_eq!(events.recv().await, None);
}
