//! Courier location reporter.
//!
//! One reporter per courier device. At most one order is tracked at a
//! time: starting tracking for a new order replaces the previous watch.
//! Sample errors are logged and skipped so a flaky GPS does not tear down
//! the whole watch.

use super::sensor::{GeoError, GeoSensor};
use crate::store::OrderStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct ActiveWatch {
    order_id: i64,
    handle: JoinHandle<()>,
}

/// Forwards sensor samples into the order row being delivered.
pub struct LocationReporter {
    sensor: Arc<dyn GeoSensor>,
    orders: Arc<dyn OrderStore>,
    active: Mutex<Option<ActiveWatch>>,
}

impl LocationReporter {
    pub fn new(sensor: Arc<dyn GeoSensor>, orders: Arc<dyn OrderStore>) -> Self {
        Self {
            sensor,
            orders,
            active: Mutex::new(None),
        }
    }

    /// Begin forwarding position samples into order `order_id`.
    ///
    /// Any watch already running is stopped first.
    pub async fn start(&self, order_id: i64) -> Result<(), GeoError> {
        self.stop();

        let mut stream = self.sensor.watch().await?;
        let orders = Arc::clone(&self.orders);
        let handle = tokio::spawn(async move {
            while let Some(sample) = stream.recv().await {
                match sample {
                    Ok(position) => {
                        if let Err(err) = orders
                            .update_courier_position(
                                order_id,
                                position.latitude,
                                position.longitude,
                            )
                            .await
                        {
                            warn!(order_id, error = %err, "failed to record courier position");
                        }
                    }
                    Err(err) => {
                        warn!(order_id, error = %err, "position sample failed, skipping");
                    }
                }
            }
            debug!(order_id, "position stream ended");
        });

        info!(order_id, "courier tracking started");
        *self.active.lock() = Some(ActiveWatch { order_id, handle });
        Ok(())
    }

    /// Stop the current watch, if any. Idempotent.
    pub fn stop(&self) {
        if let Some(watch) = self.active.lock().take() {
            watch.handle.abort();
            info!(order_id = watch.order_id, "courier tracking stopped");
        }
    }

    /// The order currently being tracked, if any.
    pub fn active_order(&self) -> Option<i64> {
        self.active.lock().as_ref().map(|w| w.order_id)
    }
}

impl Drop for LocationReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewOrder, OrderItem, OrderPayment};
    use crate::store::MemoryStore;
    use crate::tracking::sensor::{Position, ScriptedSensor};

    fn draft() -> NewOrder {
        NewOrder {
            nama: "Budi".to_string(),
            telepon: "0812000111".to_string(),
            alamat_detail: "Jl. Mawar 1".to_string(),
            google_map_url: "https://www.google.com/maps?q=-6.2,106.8".to_string(),
            latitude: -6.2,
            longitude: 106.8,
            items: vec![OrderItem {
                id: 1,
                name: "Cilok Ayam Suwir".to_string(),
                price: 7000,
                qty: 2,
            }],
            subtotal: 14000,
            ongkir: 5000,
            total_bayar: 19000,
            metode_pembayaran: OrderPayment::Cod,
            gambar: None,
        }
    }

    async fn wait_for_courier_lat(store: &MemoryStore, order_id: i64, lat: f64) {
        for _ in 0..200 {
            let order = store.find_order(order_id).await.unwrap();
            if order.kurir_lat == Some(lat) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("courier position never reached {lat}");
    }

    #[tokio::test]
    async fn test_samples_land_on_the_order() {
        let store = Arc::new(MemoryStore::new());
        let order = store.insert_order(draft()).await.unwrap();

        let sensor = Arc::new(ScriptedSensor::new());
        let feed = sensor.stage_watch();
        let reporter = LocationReporter::new(sensor, store.clone());

        reporter.start(order.id).await.unwrap();
        assert_eq!(reporter.active_order(), Some(order.id));

        feed.send(Ok(Position {
            latitude: -6.21,
            longitude: 106.81,
        }))
        .await
        .unwrap();

        wait_for_courier_lat(&store, order.id, -6.21).await;

        let tracked = store.find_order(order.id).await.unwrap();
        assert_eq!(tracked.kurir_lng, Some(106.81));
    }

    #[tokio::test]
    async fn test_sample_error_does_not_end_the_watch() {
        let store = Arc::new(MemoryStore::new());
        let order = store.insert_order(draft()).await.unwrap();

        let sensor = Arc::new(ScriptedSensor::new());
        let feed = sensor.stage_watch();
        let reporter = LocationReporter::new(sensor, store.clone());
        reporter.start(order.id).await.unwrap();

        feed.send(Err(GeoError::Unavailable)).await.unwrap();
        feed.send(Ok(Position {
            latitude: -6.3,
            longitude: 106.9,
        }))
        .await
        .unwrap();

        wait_for_courier_lat(&store, order.id, -6.3).await;
    }

    #[tokio::test]
    async fn test_new_watch_replaces_previous() {
        let store = Arc::new(MemoryStore::new());
        let first = store.insert_order(draft()).await.unwrap();
        let second = store.insert_order(draft()).await.unwrap();

        let sensor = Arc::new(ScriptedSensor::new());
        let _first_feed = sensor.stage_watch();
        let _second_feed = sensor.stage_watch();
        let reporter = LocationReporter::new(sensor, store.clone());

        reporter.start(first.id).await.unwrap();
        reporter.start(second.id).await.unwrap();
        assert_eq!(reporter.active_order(), Some(second.id));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let order = store.insert_order(draft()).await.unwrap();

        let sensor = Arc::new(ScriptedSensor::new());
        let _feed = sensor.stage_watch();
        let reporter = LocationReporter::new(sensor, store.clone());
        reporter.start(order.id).await.unwrap();

        reporter.stop();
        reporter.stop();
        assert_eq!(reporter.active_order(), None);
    }

    #[tokio::test]
    async fn test_unsupported_sensor_fails_start() {
        let store = Arc::new(MemoryStore::new());
        let sensor = Arc::new(ScriptedSensor::new());
        let reporter = LocationReporter::new(sensor, store);

        let err = reporter.start(1).await.unwrap_err();
        assert_eq!(err, GeoError::Unsupported);
        assert_eq!(reporter.active_order(), None);
    }
}
