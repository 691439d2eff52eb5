use std::sync::Arc;
use std::thread;

use bit_sliced::{BitSlicedBitmap, SnapshotCell, Strategy};

const DEPTH: usize = 6;
const SIZE: u64 = 1 << 12;

fn main() -> Result<(), bit_sliced::Error> {
    let cell = Arc::new(SnapshotCell::new(BitSlicedBitmap::new(DEPTH, SIZE)?));

    let reader = {
        let cell = Arc::clone(&cell);
        thread::spawn(move || {
            // every snapshot is internally consistent, however many
            // versions get published meanwhile
            for _ in 0..8 {
                let snapshot = cell.load();
                let present = snapshot.len();
                println!("reader sees {present} slots");
                thread::yield_now();
            }
        })
    };

    for round in 0..8u64 {
        let ids: Vec<u64> = (0..64).map(|i| round * 512 + i * 8).collect();
        let values: Vec<u64> = ids.iter().map(|id| id % (1 << DEPTH)).collect();
        let next = cell.update(Strategy::Batched, &ids, &values)?;
        println!("round {round}: published {} slots", next.len());
    }

    reader.join().expect("reader thread panicked");

    let last = cell.load();
    println!("{:?}", last.get(8));
    Ok(())
}
