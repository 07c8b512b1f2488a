use tokio_postgres::GenericClient;

use crate::models::{PulseOximetry, ReadingBatch};

// The timestamp is rendered once per request as text and bound as a text
// parameter; the cast to timestamp happens server-side. Casting the
// placeholder directly (`$n::timestamp`) would make the server describe the
// parameter as TIMESTAMP, which the text binding does not accept.
const SQL_INSERT_TEMPERATURE: &str = "INSERT INTO temperature_readings \
(profile_id, sensor_id, temperature, recorded_at) \
VALUES ($1, $2, $3, $4::text::timestamp)";
const SQL_INSERT_PULSE_OXIMETRY: &str = "INSERT INTO pulse_oximetry_readings \
(profile_id, sensor_id, heart_rate, spo2, recorded_at) \
VALUES ($1, $2, $3, $4, $5::text::timestamp)";
const SQL_INSERT_ECG: &str = "INSERT INTO ecg_readings \
(profile_id, sensor_id, value, recorded_at) \
VALUES ($1, $2, $3, $4::text::timestamp)";
const SQL_PING: &str = "SELECT 1";

/// One insert per reading category. Implemented for every tokio-postgres
/// client; the service layer stays generic so the fan-out logic can be
/// exercised without a database.
pub trait ReadingStore {
    type Error: std::fmt::Display;

    async fn insert_temperature(
        &self,
        batch: &ReadingBatch,
        temperature: f64,
    ) -> Result<(), Self::Error>;

    async fn insert_pulse_oximetry(
        &self,
        batch: &ReadingBatch,
        pulse: &PulseOximetry,
    ) -> Result<(), Self::Error>;

    async fn insert_ecg(&self, batch: &ReadingBatch, value: i64) -> Result<(), Self::Error>;
}

impl<C: GenericClient> ReadingStore for C {
    type Error = tokio_postgres::Error;

    async fn insert_temperature(
        &self,
        batch: &ReadingBatch,
        temperature: f64,
    ) -> Result<(), Self::Error> {
        self.execute(
            SQL_INSERT_TEMPERATURE,
            &[
                &batch.profile_id,
                &batch.sensor_id,
                &temperature,
                &batch.recorded_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn insert_pulse_oximetry(
        &self,
        batch: &ReadingBatch,
        pulse: &PulseOximetry,
    ) -> Result<(), Self::Error> {
        self.execute(
            SQL_INSERT_PULSE_OXIMETRY,
            &[
                &batch.profile_id,
                &batch.sensor_id,
                &pulse.heart_rate,
                &pulse.spo2,
                &batch.recorded_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn insert_ecg(&self, batch: &ReadingBatch, value: i64) -> Result<(), Self::Error> {
        self.execute(
            SQL_INSERT_ECG,
            &[
                &batch.profile_id,
                &batch.sensor_id,
                &value,
                &batch.recorded_at,
            ],
        )
        .await?;
        Ok(())
    }
}

pub async fn ping(db: &impl GenericClient) -> Result<(), tokio_postgres::Error> {
    db.query_one(SQL_PING, &[]).await?;
    Ok(())
}
