/// A binary structuring element anchored at its center.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Kernel {
    /// Create a square elliptical structuring element of side `ksize`.
    ///
    /// The ellipse follows the usual rasterization: for each row offset `dy`
    /// from the center, the half width is `round(r * sqrt(1 - dy² / r²))` with `r = ksize / 2`.
    pub fn ellipse(ksize: usize) -> Self {
        let mut data = vec![0u8; ksize * ksize];
        let r = (ksize / 2) as i64;
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

        for (i, row) in data.chunks_exact_mut(ksize.max(1)).enumerate() {
            let dy = i as i64 - r;
            let dx = (r as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i64;
            let (j1, j2) = ((r - dx).max(0), (r + dx + 1).min(ksize as i64));
            for v in row.iter_mut().take(j2.max(0) as usize).skip(j1 as usize) {
                *v = 1;
            }
        }

        Self {
            data,
            width: ksize,
            height: ksize,
        }
    }

    /// Offsets `(dy, dx)` of the element members relative to the anchor.
    pub(crate) fn offsets(&self) -> Vec<(isize, isize)> {
        let (ay, ax) = ((self.height / 2) as isize, (self.width / 2) as isize);
        self.data
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 1)
            .map(|(idx, _)| {
                (
                    (idx / self.width) as isize - ay,
                    (idx % self.width) as isize - ax,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipse_kernel_3x3() {
        let kernel = Kernel::ellipse(3);
        #[rustfmt::skip]
        let expected = [
            0, 1, 0,
            1, 1, 1,
            0, 1, 0,
        ];
        assert_eq!(kernel.data, expected);
    }

    #[test]
    fn test_ellipse_kernel_1x1() {
        let kernel = Kernel::ellipse(1);
        assert_eq!(kernel.data, vec![1]);
        assert_eq!(kernel.offsets(), vec![(0, 0)]);
    }

    #[test]
    fn test_ellipse_kernel_5x5() {
        let kernel = Kernel::ellipse(5);
        #[rustfmt::skip]
        let expected = [
            0, 0, 1, 0, 0,
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
            1, 1, 1, 1, 1,
            0, 0, 1, 0, 0,
        ];
        assert_eq!(kernel.data, expected);
    }

    #[test]
    fn test_kernel_offsets() {
        let kernel = Kernel::ellipse(3);
        let offsets = kernel.offsets();
        assert_eq!(offsets, vec![(-1, 0), (0, -1), (0, 0), (0, 1), (1, 0)]);
    }
}
