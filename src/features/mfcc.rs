use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use aus::WindowType;

pub(crate) const TARGET_SAMPLE_RATE: u32 = 16_000;
pub(crate) const WINDOW_MS: usize = 15;
pub(crate) const HOP_MS: usize = 5;
pub const MEL_BANDS: usize = 26;
const MIN_FREQ: f64 = 20.0;
// Silent frames would otherwise hit log(0) in the cepstrum.
const MEL_FLOOR: f64 = 1e-10;

pub(crate) fn window_samples() -> usize {
    ((TARGET_SAMPLE_RATE as usize * WINDOW_MS) / 1000).max(1)
}

pub(crate) fn hop_samples() -> usize {
    ((TARGET_SAMPLE_RATE as usize * HOP_MS) / 1000).max(1)
}

/// Frame-major MFCCs (`frames × coefficients`) of audio at `TARGET_SAMPLE_RATE`.
pub(crate) fn mfcc_frames(audio: Vec<f64>, coefficients: usize) -> Vec<Vec<f64>> {
    let fft_size = window_samples();
    let hop_size = hop_samples();

    let stft = spectrum::rstft(&audio, fft_size, hop_size, WindowType::Hanning);
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);

    let freqs = spectrum::rfftfreq(fft_size, TARGET_SAMPLE_RATE);
    let filterbank = MelFilterbank::new(
        MIN_FREQ,
        (TARGET_SAMPLE_RATE as f64) / 2.0,
        MEL_BANDS,
        &freqs,
        true,
    );
    let mut mel = analysis::mel::make_mel_spectrogram(&power, &filterbank);
    for frame in mel.iter_mut() {
        for energy in frame.iter_mut() {
            *energy = energy.max(MEL_FLOOR);
        }
    }

    analysis::mel::mfcc_spectrogram(&mel, coefficients, None)
}
