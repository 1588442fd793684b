//! Terminal size queries

use std::io;
use std::os::fd::AsRawFd;

use nix::libc;
use portable_pty::PtySize;

/// Size used when no terminal can be queried
pub const DEFAULT_SIZE: PtySize = PtySize {
    rows: 24,
    cols: 80,
    pixel_width: 0,
    pixel_height: 0,
};

nix::ioctl_read_bad!(tiocgwinsz, libc::TIOCGWINSZ, libc::winsize);

fn query(fd: libc::c_int) -> Option<PtySize> {
    let mut ws = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    // SAFETY: TIOCGWINSZ only writes into the winsize we pass.
    unsafe { tiocgwinsz(fd, &mut ws) }.ok()?;
    if ws.ws_row == 0 || ws.ws_col == 0 {
        return None;
    }
    Some(PtySize {
        rows: ws.ws_row,
        cols: ws.ws_col,
        pixel_width: ws.ws_xpixel,
        pixel_height: ws.ws_ypixel,
    })
}

/// Size of the real terminal, if any standard stream is attached to one
pub fn window_size() -> Option<PtySize> {
    query(io::stdout().as_raw_fd())
        .or_else(|| query(io::stdin().as_raw_fd()))
        .or_else(|| query(io::stderr().as_raw_fd()))
}

/// Size of the real terminal, or [`DEFAULT_SIZE`]
pub fn current_size() -> PtySize {
    window_size().unwrap_or(DEFAULT_SIZE)
}
