use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use dartrie::{Statistics, Trie};

use clap::Parser;
use rand::seq::SliceRandom;

const TRIALS: usize = 10;
const SAMPLES: usize = 1000;

#[derive(Parser, Debug)]
#[command(name = "bench", about = "A program to measure the performance.")]
struct Args {
    #[arg(short = 'k', long)]
    keys_filename: String,

    #[arg(short = 'p', long)]
    prefixes_filename: Option<String>,
}

fn main() {
    let args = Args::parse();

    println!("keys_filename: {}", &args.keys_filename);
    let keys = load_file(&args.keys_filename);
    let queries = random_sample(&keys);
    let prefixes = args.prefixes_filename.as_ref().map(|filename| {
        println!("prefixes_filename: {}", filename);
        load_file(filename)
    });

    println!("#keys: {}", keys.len());

    let start = Instant::now();
    let mut trie = Trie::new();
    for (i, key) in keys.iter().enumerate() {
        trie.insert(key.as_bytes(), i as i32).unwrap();
    }
    let duration = start.elapsed();
    let status = trie.status();
    print_heap_bytes(trie.heap_bytes());
    println!("num_keys: {}", status.keys);
    println!("num_elems: {}", trie.num_elems());
    println!("vacant_ratio: {:.3}", trie.vacant_ratio());
    println!("constr_sec: {:.3}", duration.as_secs_f64());

    {
        // Warmup
        let mut dummy = 0i64;
        for q in &queries {
            dummy += i64::from(trie.get(q.as_bytes()).unwrap());
        }
        // Measure
        let start = Instant::now();
        for _ in 0..TRIALS {
            for q in &queries {
                dummy += i64::from(trie.get(q.as_bytes()).unwrap());
            }
        }
        let duration = start.elapsed();
        println!(
            "get: {:.3} [us/query]",
            duration.as_secs_f64() * 1000000. / TRIALS as f64 / queries.len() as f64
        );
        println!("dummy: {}", dummy);
    }

    {
        // Warmup
        let mut dummy = 0usize;
        for q in &queries {
            dummy += trie.common_prefix_search(q.as_bytes()).count();
        }
        // Measure
        let start = Instant::now();
        for _ in 0..TRIALS {
            for q in &queries {
                dummy += trie.common_prefix_search(q.as_bytes()).count();
            }
        }
        let duration = start.elapsed();
        println!(
            "common_prefix_search: {:.3} [us/query]",
            duration.as_secs_f64() * 1000000. / TRIALS as f64 / queries.len() as f64
        );
        println!("dummy: {}", dummy);
    }

    if let Some(prefixes) = prefixes.as_ref() {
        // Warmup
        let mut dummy = 0usize;
        for p in prefixes {
            dummy += trie.predictive_search(p.as_bytes()).count();
        }
        // Measure
        let start = Instant::now();
        for _ in 0..TRIALS {
            for p in prefixes {
                dummy += trie.predictive_search(p.as_bytes()).count();
            }
        }
        let duration = start.elapsed();
        println!(
            "predictive_search: {:.3} [us/prefix]",
            duration.as_secs_f64() * 1000000. / TRIALS as f64 / prefixes.len() as f64
        );
        println!("dummy: {}", dummy);
    }
}

fn print_heap_bytes(bytes: usize) {
    println!(
        "heap_bytes: {} bytes, {:.3} MiB",
        bytes,
        bytes as f64 / (1024.0 * 1024.0)
    );
}

fn load_file<P>(path: P) -> Vec<String>
where
    P: AsRef<Path>,
{
    let file = File::open(path).unwrap();
    let buf = BufReader::new(file);
    buf.lines().map(|line| line.unwrap()).collect()
}

fn random_sample(keys: &[String]) -> Vec<String> {
    let mut rng = rand::thread_rng();
    keys.choose_multiple(&mut rng, SAMPLES.min(keys.len()))
        .cloned()
        .collect()
}
