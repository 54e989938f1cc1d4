//! Multipart reassembly on top of frame-at-a-time receive.

use bytes::Bytes;
use std::io;
use zpipe_zmtp::RecvSocket;

/// Receive one complete message.
///
/// One frame is taken unconditionally; then frames are appended while the
/// MORE flag of the frame just received is set. The result holds every frame
/// of exactly one message, in the order sent.
///
/// On error the frames read so far are discarded; the next call starts at
/// whatever frame the socket delivers next.
pub async fn receive_multipart<S>(socket: &mut S) -> io::Result<Vec<Bytes>>
where
    S: RecvSocket + ?Sized,
{
    let mut frames = vec![socket.recv_frame().await?];
    while socket.has_more() {
        frames.push(socket.recv_frame().await?);
    }
    Ok(frames)
}

/// Total body length of a message.
pub fn message_len(frames: &[Bytes]) -> usize {
    frames.iter().map(Bytes::len).sum()
}
