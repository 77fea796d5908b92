//! Recursive radix-2 Cooley-Tukey FFT.
//!
//! The spectrogram engine only ever calls this on power-of-two window sizes
//! (fixed at 4096), so the recursive decimation-in-time form is sufficient.

use crate::dsp::complex::Complex;

/// Computes the forward DFT of `buf` in place. `buf.len()` must be a power of two.
pub fn forward(buf: &mut [Complex]) {
    let n = buf.len();
    if n <= 1 {
        return;
    }

    debug_assert!(n.is_power_of_two(), "FFT size must be a power of two");

    let mut even: Vec<Complex> = Vec::with_capacity(n / 2);
    let mut odd: Vec<Complex> = Vec::with_capacity(n / 2);

    for (i, &sample) in buf.iter().enumerate() {
        if i % 2 == 0 {
            even.push(sample);
        } else {
            odd.push(sample);
        }
    }

    forward(&mut even);
    forward(&mut odd);

    // P(ω) = Pe(ω²) + ω·Po(ω²), P(-ω) = Pe(ω²) - ω·Po(ω²)
    for j in 0..n / 2 {
        let theta = (2.0 * std::f32::consts::PI * j as f32) / n as f32;
        let twiddle = Complex::from_polar(1.0, -theta);
        buf[j] = even[j] + (twiddle * odd[j]);
        buf[j + n / 2] = even[j] - (twiddle * odd[j]);
    }
}

pub fn real_to_complex(samples: &[f32]) -> Vec<Complex> {
    samples.iter().map(|&s| Complex::new(s, 0.0)).collect()
}
