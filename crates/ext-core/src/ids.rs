//! Local operation identifiers handed to the host.
//!
//! The underlying wire serials are an implementation detail; the host gets
//! opaque non-zero ids drawn at random and mapped to the serial they stand
//! for while the operation is in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::Rng;

pub(crate) fn alloc_local_id<V>(map: &Arc<Mutex<HashMap<u32, V>>>) -> u32 {
    let map = map.lock().unwrap();
    let mut rng = rand::thread_rng();
    loop {
        let id: u32 = rng.gen();
        if id != 0 && !map.contains_key(&id) {
            return id;
        }
    }
}
