//! YUV4MPEG2 (`.y4m`) reader.
//!
//! Stream parsing is done by the `y4m` crate. This module adapts its
//! decoder to [`FrameSource`] and converts 8-bit 4:2:0, 4:2:2, 4:4:4 and
//! mono frames to RGB with BT.601 limited-range coefficients.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ::y4m::{Colorspace, Decoder};
use imgref::ImgVec;
use rgb::RGB8;

use super::{Frame, FrameSource};
use crate::error::{Error, Result};

const BACKEND_NAME: &str = "y4m";
const FRAME_MARKER_LEN: usize = b"FRAME\n".len();

/// Chroma layout of an 8-bit Y4M stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chroma {
    Yuv420,
    Yuv422,
    Yuv444,
    Mono,
}

impl Chroma {
    fn from_colorspace(colorspace: Colorspace) -> Result<Self> {
        match colorspace {
            Colorspace::C420
            | Colorspace::C420jpeg
            | Colorspace::C420paldv
            | Colorspace::C420mpeg2 => Ok(Self::Yuv420),
            Colorspace::C422 => Ok(Self::Yuv422),
            Colorspace::C444 => Ok(Self::Yuv444),
            Colorspace::Cmono => Ok(Self::Mono),
            other => Err(Error::UnsupportedFormat(format!("y4m colorspace {other:?}"))),
        }
    }

    fn plane_dims(self, width: usize, height: usize) -> (usize, usize) {
        match self {
            Self::Yuv420 => (width.div_ceil(2), height.div_ceil(2)),
            Self::Yuv422 => (width.div_ceil(2), height),
            Self::Yuv444 => (width, height),
            Self::Mono => (0, 0),
        }
    }

    /// Bytes of planar data in one frame, `None` on overflow.
    fn frame_len(self, width: usize, height: usize) -> Option<usize> {
        let (cw, ch) = self.plane_dims(width, height);
        let chroma = cw.checked_mul(ch)?.checked_mul(2)?;
        width.checked_mul(height)?.checked_add(chroma)
    }
}

/// A `.y4m` file opened for sequential reading.
pub struct Y4mSource {
    decoder: Decoder<BufReader<File>>,
    chroma: Chroma,
    frame_count: usize,
}

impl Y4mSource {
    /// Open a file and parse its stream header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::video(BACKEND_NAME, format!("{}: {e}", path.display())))?;
        let file_len = file.metadata()?.len() as usize;
        let mut reader = BufReader::new(file);
        let header_len = check_header(reader.fill_buf()?)?;

        let decoder = ::y4m::decode(reader)
            .map_err(|e| Error::video(BACKEND_NAME, format!("{}: {e:?}", path.display())))?;
        let chroma = Chroma::from_colorspace(decoder.get_colorspace())?;
        let frame_len = chroma
            .frame_len(decoder.get_width(), decoder.get_height())
            .and_then(|len| len.checked_add(FRAME_MARKER_LEN))
            .ok_or_else(|| Error::video(BACKEND_NAME, "frame size overflows"))?;

        // Assumes bare "FRAME\n" markers; frames with parameters make this an overestimate.
        let frame_count = file_len.saturating_sub(header_len) / frame_len;

        Ok(Self {
            decoder,
            chroma,
            frame_count,
        })
    }
}

impl FrameSource for Y4mSource {
    fn frame_count(&self) -> Option<usize> {
        Some(self.frame_count)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let width = self.decoder.get_width();
        let height = self.decoder.get_height();
        let chroma = self.chroma;
        match self.decoder.read_frame() {
            Ok(frame) => Ok(Some(to_rgb(
                chroma,
                width,
                height,
                frame.get_y_plane(),
                frame.get_u_plane(),
                frame.get_v_plane(),
            ))),
            Err(::y4m::Error::EOF) => Ok(None),
            Err(e) => Err(Error::video(BACKEND_NAME, format!("{e:?}"))),
        }
    }
}

/// Length of the buffered stream header line.
///
/// Rejects `W`/`H` values whose product, at up to three 16-bit planes,
/// overflows `usize` before the decoder sizes its frame buffer.
fn check_header(buf: &[u8]) -> Result<usize> {
    let end = buf
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| Error::video(BACKEND_NAME, "missing or unterminated stream header"))?;

    let mut area = Some(6usize);
    for token in buf[..end].split(|&b| b == b' ') {
        let [b'W' | b'H', digits @ ..] = token else {
            continue;
        };
        let value = std::str::from_utf8(digits).ok().and_then(|s| s.parse::<usize>().ok());
        if let Some(value) = value {
            area = area.and_then(|a| a.checked_mul(value));
        }
    }
    if area.is_none() {
        return Err(Error::video(BACKEND_NAME, "frame size overflows"));
    }
    Ok(end + 1)
}

fn to_rgb(
    chroma: Chroma,
    width: usize,
    height: usize,
    luma: &[u8],
    u_plane: &[u8],
    v_plane: &[u8],
) -> Frame {
    let (cw, _) = chroma.plane_dims(width, height);
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let i = match chroma {
                Chroma::Yuv420 => Some((y / 2) * cw + x / 2),
                Chroma::Yuv422 => Some(y * cw + x / 2),
                Chroma::Yuv444 => Some(y * cw + x),
                Chroma::Mono => None,
            };
            let (u, v) = i.map_or((128, 128), |i| (u_plane[i], v_plane[i]));
            pixels.push(yuv_to_rgb(luma[y * width + x], u, v));
        }
    }
    ImgVec::new(pixels, width, height)
}

/// BT.601 limited-range YUV to RGB.
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> RGB8 {
    let c = 1.164 * (f32::from(y) - 16.0);
    let d = f32::from(u) - 128.0;
    let e = f32::from(v) - 128.0;
    let clamp = |x: f32| x.round().clamp(0.0, 255.0) as u8;
    RGB8::new(
        clamp(c + 1.596 * e),
        clamp(c - 0.392 * d - 0.813 * e),
        clamp(c + 2.017 * d),
    )
}

/// Write a gray 4:2:0 test stream with one luma level per frame.
#[cfg(test)]
pub(crate) fn write_gray_y4m(path: &Path, width: usize, height: usize, lumas: &[u8]) {
    let mut data = format!("YUV4MPEG2 W{width} H{height} F25:1 Ip A1:1 C420jpeg\n").into_bytes();
    let chroma_len = width.div_ceil(2) * height.div_ceil(2);
    for &luma in lumas {
        data.extend_from_slice(b"FRAME\n");
        data.extend(std::iter::repeat_n(luma, width * height));
        data.extend(std::iter::repeat_n(128, 2 * chroma_len));
    }
    std::fs::write(path, data).unwrap();
}
