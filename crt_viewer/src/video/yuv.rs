//! Planar Y'CbCr (as decoded by libtheora) to RGBA8.

use theorafile_rs::{
    th_pixel_fmt, th_pixel_fmt_TH_PF_420, th_pixel_fmt_TH_PF_422, th_pixel_fmt_TH_PF_444,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsampling {
    Yuv420,
    Yuv422,
    Yuv444,
}

impl Subsampling {
    pub fn from_theora(format: th_pixel_fmt) -> Option<Self> {
        match format {
            pf if pf == th_pixel_fmt_TH_PF_420 => Some(Self::Yuv420),
            pf if pf == th_pixel_fmt_TH_PF_422 => Some(Self::Yuv422),
            pf if pf == th_pixel_fmt_TH_PF_444 => Some(Self::Yuv444),
            _ => None,
        }
    }

    fn shift(self) -> (usize, usize) {
        match self {
            Self::Yuv420 => (1, 1),
            Self::Yuv422 => (1, 0),
            Self::Yuv444 => (0, 0),
        }
    }
}

/// Sizes of the three planes tf_readvideo packs back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    width: usize,
    height: usize,
    chroma_width: usize,
    chroma_height: usize,
    subsampling: Subsampling,
}

impl PlaneLayout {
    pub fn new(width: usize, height: usize, subsampling: Subsampling) -> Self {
        let (sx, sy) = subsampling.shift();
        Self {
            width,
            height,
            chroma_width: (width >> sx).max(1),
            chroma_height: (height >> sy).max(1),
            subsampling,
        }
    }

    pub fn yuv_len(&self) -> Option<usize> {
        let luma = self.width.checked_mul(self.height)?;
        let chroma = self.chroma_width.checked_mul(self.chroma_height)?;
        luma.checked_add(chroma.checked_mul(2)?)
    }

    pub fn rgba_len(&self) -> Option<usize> {
        self.width.checked_mul(self.height)?.checked_mul(4)
    }

    pub fn subsampling(&self) -> Subsampling {
        self.subsampling
    }

    /// Convert a packed Y, Cb, Cr buffer into `rgba`, which must hold
    /// `rgba_len()` bytes.
    pub fn convert(&self, yuv: &[u8], rgba: &mut [u8]) {
        let luma_len = self.width * self.height;
        let chroma_len = self.chroma_width * self.chroma_height;
        let (luma, rest) = yuv.split_at(luma_len);
        let (cb_plane, cr_plane) = rest.split_at(chroma_len);
        let (sx, sy) = self.subsampling.shift();

        for (row, out_row) in rgba.chunks_exact_mut(self.width * 4).enumerate().take(self.height) {
            let chroma_row = (row >> sy).min(self.chroma_height - 1) * self.chroma_width;
            for (col, out) in out_row.chunks_exact_mut(4).enumerate() {
                let chroma = chroma_row + (col >> sx).min(self.chroma_width - 1);
                let [r, g, b] = ycbcr_to_rgb(
                    luma[row * self.width + col],
                    cb_plane[chroma],
                    cr_plane[chroma],
                );
                out.copy_from_slice(&[r, g, b, 255]);
            }
        }
    }
}

/// BT.601 studio-range conversion, the range Theora encodes in.
fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = 1.164 * (y as f32 - 16.0);
    let cb = cb as f32 - 128.0;
    let cr = cr as f32 - 128.0;
    let r = y + 1.596 * cr;
    let g = y - 0.392 * cb - 0.813 * cr;
    let b = y + 2.017 * cb;
    [r, g, b].map(|v| v.round().clamp(0.0, 255.0) as u8)
}
