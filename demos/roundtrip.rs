//! Encodes a synthetic multi-channel series at a range of quantization error
//! bounds, then drains the decoder on a background thread while printing a
//! handful of rows and the achieved bits-per-sample.

use std::sync::mpsc::sync_channel;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vecxor::{enum_borrow, CancelToken, Decoder, Encoder, Vec64, VecPool};

fn print_row(i: usize, input: &[f64], output: &[f64]) {
    print!("    {i:4}:");
    for x in input {
        print!(" {x:7.4}");
    }
    print!("  =>");
    for x in output {
        print!(" {x:7.4}");
    }
    println!();
}

fn generate_data(n: usize) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(1);
    (0..n)
        .map(|i| {
            let n: f64 = (rng.gen::<f64>() * 10_000.0).round() / 100.0;
            vec![n, 1.0 / (1.0 + n), (1 + (i / 5) % 42) as f64, (1 + i / 13) as f64]
        })
        .collect()
}

fn run_round(span: usize, max_error: f64, series: &[Vec<f64>]) {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf, span);
    let mut tmp = vec![0.0; span];
    for vec in series {
        for (t, v) in tmp.iter_mut().zip(vec.iter()) {
            *t = vecxor::lossy_float64(*v, max_error);
        }
        enc.put(&Vec64::from_f64(&tmp)).unwrap();
    }
    enc.close().unwrap();
    let num_bytes = buf.len();

    let pool = VecPool::new(span);
    let (tx, rx) = sync_channel(1);
    let cancel = CancelToken::new();

    std::thread::scope(|s| {
        let mut dec = Decoder::new(buf.as_slice(), span);
        let handle = s.spawn(|| enum_borrow(&mut dec, &cancel, &tx, &pool));

        let log_lines = 2;
        let mut i = 0;
        for vec in rx.iter() {
            if i < (log_lines + 1) / 2 || i >= series.len() - log_lines / 2 {
                print_row(i, &series[i], &vec.to_f64_vec());
            }
            pool.put(vec);
            i += 1;
        }

        handle.join().unwrap().expect("drain failed");
    });

    let bps = (num_bytes * 8) as f64 / (series.len() * span) as f64;
    if max_error > 0.0 {
        println!("|e|={max_error:<5.0e}: {bps:6.3} b/sample");
    } else {
        println!("(lossless)    {bps:.3} b/sample");
    }
}

fn main() {
    env_logger::init();

    let series = generate_data(1000);
    let span = series[0].len();

    let mut max_error = 1e-1;
    while max_error > 1e-16 {
        run_round(span, max_error, &series);
        max_error *= 1e-3;
    }

    println!();
    run_round(span, 0.0, &series);
}
