// Reference harness: one publisher thread, NUM_THREADS consumer threads,
// machine-word records over a single page-sized queue.
// Run with: cargo run --example threaded_queue

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use mirrorq::{page_size, BoundedQueue};

const NUM_THREADS: usize = 8;
const WORD: usize = std::mem::size_of::<usize>();

fn main() -> mirrorq::Result<()> {
    let capacity = page_size();
    let messages_per_thread = 2 * capacity;
    let total = NUM_THREADS * messages_per_thread;

    let queue = Arc::new(BoundedQueue::new(capacity)?);
    println!(
        "queue: {} byte ring, {} consumers, {} messages total",
        capacity, NUM_THREADS, total
    );

    let start = Instant::now();

    let mut consumers = Vec::with_capacity(NUM_THREADS);
    for id in 0..NUM_THREADS {
        let queue = Arc::clone(&queue);
        consumers.push(thread::spawn(move || {
            let mut received = 0usize;
            for _ in 0..messages_per_thread {
                let bytes = queue.get(WORD).expect("get failed");
                let _record = usize::from_le_bytes(bytes.try_into().unwrap());
                received += 1;
            }
            (id, received)
        }));
    }

    let publisher = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut sent = 0usize;
            for record in 0..total {
                queue.put(&record.to_le_bytes()).expect("put failed");
                sent += 1;
            }
            sent
        })
    };

    let sent = publisher.join().expect("publisher panicked");
    println!("publisher: sent {} messages", sent);

    for consumer in consumers {
        let (id, received) = consumer.join().expect("consumer panicked");
        println!("consumer {}: received {} messages", id, received);
    }

    println!("done in {:.2?}", start.elapsed());
    Ok(())
}
