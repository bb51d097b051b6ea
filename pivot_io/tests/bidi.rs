use rand::{Rng, RngCore};

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use pivot_io::{bidi_pump, set_buf_size};

async fn pair() -> (TcpStream, TcpStream) {
    let lis = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = lis.local_addr().unwrap();
    let (client, accepted) = tokio::join!(TcpStream::connect(addr), lis.accept());
    (client.unwrap(), accepted.unwrap().0)
}

fn random_payload(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}

async fn write_in_random_chunks<W: AsyncWrite + Unpin>(w: &mut W, data: &[u8]) {
    let mut off = 0;
    while off < data.len() {
        let n = rand::thread_rng().gen_range(1..=(3 * pivot_io::DF_BUF_SIZE)).min(data.len() - off);
        w.write_all(&data[off..off + n]).await.unwrap();
        off += n;
    }
}

#[tokio::test]
async fn both_directions_arrive_intact() {
    set_buf_size(pivot_io::DF_BUF_SIZE);

    // left_peer <-> [left | relay | right] <-> right_peer
    let (left_peer, left) = pair().await;
    let (right, right_peer) = pair().await;

    let relay = tokio::spawn(async move {
        let (mut lr, mut lw) = left.into_split();
        let (mut rr, mut rw) = right.into_split();
        bidi_pump(&mut lr, &mut lw, &mut rr, &mut rw).await
    });

    let up = random_payload(300_000);
    let down = random_payload(170_000);

    let (mut lp_r, mut lp_w) = left_peer.into_split();
    let (mut rp_r, mut rp_w) = right_peer.into_split();

    let send_up = {
        let up = up.clone();
        tokio::spawn(async move {
            write_in_random_chunks(&mut lp_w, &up).await;
            lp_w.shutdown().await.unwrap();
        })
    };
    let send_down = {
        let down = down.clone();
        tokio::spawn(async move {
            write_in_random_chunks(&mut rp_w, &down).await;
            rp_w.shutdown().await.unwrap();
        })
    };

    let recv_up = tokio::spawn(async move {
        let mut out = Vec::new();
        rp_r.read_to_end(&mut out).await.unwrap();
        out
    });
    let recv_down = tokio::spawn(async move {
        let mut out = Vec::new();
        lp_r.read_to_end(&mut out).await.unwrap();
        out
    });

    send_up.await.unwrap();
    send_down.await.unwrap();
    assert_eq!(recv_up.await.unwrap(), up);
    assert_eq!(recv_down.await.unwrap(), down);

    let (ab, ba) = relay.await.unwrap();
    assert!(ab.is_clean() && ba.is_clean());
    assert_eq!(ab.amt, up.len() as u64);
    assert_eq!(ba.amt, down.len() as u64);
}

#[tokio::test]
async fn one_side_finishing_leaves_the_other_open() {
    let (mut left_peer, left) = pair().await;
    let (right, mut right_peer) = pair().await;

    let relay = tokio::spawn(async move {
        let (mut lr, mut lw) = left.into_split();
        let (mut rr, mut rw) = right.into_split();
        bidi_pump(&mut lr, &mut lw, &mut rr, &mut rw).await
    });

    // right is done talking
    right_peer.write_all(b"last words").await.unwrap();
    right_peer.shutdown().await.unwrap();

    let mut got = Vec::new();
    left_peer.read_to_end(&mut got).await.unwrap();
    assert_eq!(got, b"last words");

    // but still listens
    left_peer.write_all(b"are you there").await.unwrap();
    let mut buf = [0u8; 13];
    right_peer.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"are you there");

    left_peer.shutdown().await.unwrap();
    let mut rest = Vec::new();
    right_peer.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());

    let (ab, ba) = relay.await.unwrap();
    assert_eq!(ab.amt, 13);
    assert_eq!(ba.amt, 10);
}

#[tokio::test]
async fn failed_side_cuts_the_other() {
    let (left_peer, left) = pair().await;
    let (right, mut right_peer) = pair().await;

    let relay = tokio::spawn(async move {
        let (mut lr, mut lw) = left.into_split();
        let (mut rr, mut rw) = right.into_split();
        bidi_pump(&mut lr, &mut lw, &mut rr, &mut rw).await
    });

    // left resets, right stays silent
    left_peer.set_linger(Some(std::time::Duration::ZERO)).unwrap();
    drop(left_peer);

    let (ab, ba) = tokio::time::timeout(std::time::Duration::from_secs(3), relay)
        .await
        .unwrap()
        .unwrap();
    assert!(!ab.is_clean());
    assert_eq!(ba.error.unwrap().kind(), std::io::ErrorKind::ConnectionAborted);
    assert_eq!(ba.amt, 0);

    // nothing left holds the right side open
    let mut rest = Vec::new();
    let _ = right_peer.read_to_end(&mut rest).await;
    assert!(rest.is_empty());
}
