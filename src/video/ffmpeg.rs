//! FFmpeg-backed frame source for compressed containers.
//!
//! Frames are pulled one at a time: packets of the best video stream are
//! fed to the decoder only when it has no frame ready, and each decoded
//! frame is scaled to packed RGB24.

use std::path::Path;

use ffmpeg::util::error::{EAGAIN, EWOULDBLOCK};
use ffmpeg_next as ffmpeg;
use imgref::ImgVec;
use rgb::RGB8;

use super::{Frame, FrameSource};
use crate::error::{Error, Result};

const BACKEND_NAME: &str = "ffmpeg";

/// A video file decoded through libavcodec.
pub struct FfmpegSource {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    stream_index: usize,
    frame_count: Option<usize>,
    eof_sent: bool,
}

impl FfmpegSource {
    /// Open a file and set up a decoder for its best video stream.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        ffmpeg::init().map_err(|err| Error::video(BACKEND_NAME, err))?;

        let input = ffmpeg::format::input(&path).map_err(|err| Error::video(BACKEND_NAME, err))?;
        let (stream_index, frames, parameters) = {
            let stream = input
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or_else(|| Error::video(BACKEND_NAME, "no video stream found"))?;
            (stream.index(), stream.frames(), stream.parameters())
        };

        let context = ffmpeg::codec::context::Context::from_parameters(parameters)
            .map_err(|err| Error::video(BACKEND_NAME, err))?;
        let decoder = context
            .decoder()
            .video()
            .map_err(|err| Error::video(BACKEND_NAME, err))?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .map_err(|err| Error::video(BACKEND_NAME, err))?;

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            frame_count: usize::try_from(frames).ok().filter(|&n| n > 0),
            eof_sent: false,
        })
    }

    /// Send the next packet of our stream, or EOF once the input is drained.
    fn feed(&mut self) -> Result<()> {
        let mut packet = ffmpeg::Packet::empty();
        loop {
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() != self.stream_index {
                        continue;
                    }
                    return match self.decoder.send_packet(&packet) {
                        Ok(()) => Ok(()),
                        Err(err) if is_retryable_error(&err) => Ok(()),
                        Err(err) => Err(Error::video(BACKEND_NAME, err)),
                    };
                }
                Err(ffmpeg::Error::Eof) => {
                    self.decoder
                        .send_eof()
                        .map_err(|err| Error::video(BACKEND_NAME, err))?;
                    self.eof_sent = true;
                    return Ok(());
                }
                Err(err) => return Err(Error::video(BACKEND_NAME, err)),
            }
        }
    }

    fn convert(&mut self, decoded: &ffmpeg::util::frame::Video) -> Result<Frame> {
        let mut rgb = ffmpeg::util::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb)
            .map_err(|err| Error::video(BACKEND_NAME, err))?;

        let width = rgb.width() as usize;
        let height = rgb.height() as usize;
        let stride = rgb.stride(0);
        let plane = rgb.data(0);

        let mut pixels = Vec::with_capacity(width * height);
        for row in 0..height {
            let start = row * stride;
            pixels.extend(
                plane[start..start + width * 3]
                    .chunks_exact(3)
                    .map(|c| RGB8::new(c[0], c[1], c[2])),
            );
        }
        Ok(ImgVec::new(pixels, width, height))
    }
}

impl FrameSource for FfmpegSource {
    fn frame_count(&self) -> Option<usize> {
        self.frame_count
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut decoded = ffmpeg::util::frame::Video::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => return self.convert(&decoded).map(Some),
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(err) if is_retryable_error(&err) => {
                    if self.eof_sent {
                        return Ok(None);
                    }
                }
                Err(err) => return Err(Error::video(BACKEND_NAME, err)),
            }
            self.feed()?;
        }
    }
}

fn is_retryable_error(error: &ffmpeg::Error) -> bool {
    matches!(
        error,
        ffmpeg::Error::Other { errno }
            if *errno == EAGAIN || *errno == EWOULDBLOCK
    )
}
