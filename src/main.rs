//! Timing of the decoders on random data
use std::time::Instant;
use itertools::Itertools;
use rand::distributions::{Distribution, Uniform};
use rand_distr::Geometric;
use stream64::{golomb, stream_write, Stream64};

/// P of BIP-158 compact block filters
const GCS_P: usize = 19;

///d
pub fn main(){
    let n = 10_000_000;

    let packed = random_stream(n, 11);
    let stream = Stream64::new(packed, 11).unwrap();
    let now = Instant::now();
    let dec: Vec<u64> = stream.iter().collect();
    let elapsed_time = now.elapsed();
    println!("Stream64 iter\t\t\t {} in {:?}", dec.len(), elapsed_time);

    let now = Instant::now();
    let dec = stream.decode_all().unwrap();
    let elapsed_time = now.elapsed();
    println!("Stream64 decode_all\t\t {} in {:?}", dec.len(), elapsed_time);

    let set = random_set(n / 10);
    let now = Instant::now();
    let encoded = golomb::encode_sorted(&set, GCS_P).unwrap();
    let elapsed_time = now.elapsed();
    println!("golomb::encode_sorted\t\t {} in {:?}, {} bytes", set.len(), elapsed_time, encoded.len());

    let now = Instant::now();
    let dec = golomb::decode(&encoded, set.len(), GCS_P).unwrap();
    let elapsed_time = now.elapsed();
    println!("golomb::decode\t\t\t {} in {:?}", dec.len(), elapsed_time);
}

fn random_stream(n: usize, p: usize) -> Vec<u8> {
    let data_dist = Uniform::from(0..1_u64 << p);
    let mut rng = rand::thread_rng();
    let data = (0..n).map(|_| data_dist.sample(&mut rng)).collect_vec();
    stream_write(&data, p).unwrap()
}

/// sorted set with geometric gaps, mean 2^GCS_P
fn random_set(n: usize) -> Vec<u64> {
    let gap_dist = Geometric::new(1.0 / (1_u64 << GCS_P) as f64).unwrap();
    let mut rng = rand::thread_rng();
    gap_dist
        .sample_iter(&mut rng)
        .take(n)
        .scan(0_u64, |acc, gap| {
            *acc += gap;
            Some(*acc)
        })
        .collect()
}
