use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use wayfare_core::catalog::{
    Car, Cruise, CruiseQuery, Destination, Flight, FlightQuery, Hotel, Package,
};
use wayfare_core::repository::CatalogRepository;
use wayfare_core::{
    CarId, CoreResult, CruiseId, DestinationId, FlightId, HotelId, PackageId,
};
use wayfare_shared::Money;

use crate::{storage, to_count, to_int};

pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying

#[derive(sqlx::FromRow)]
struct DestinationRow {
    id: Uuid,
    name: String,
    country: String,
    description: String,
    image_url: Option<String>,
    nightly_price_minor: i64,
    currency: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<DestinationRow> for Destination {
    fn from(row: DestinationRow) -> Self {
        Destination {
            id: DestinationId(row.id),
            name: row.name,
            country: row.country,
            description: row.description,
            image_url: row.image_url,
            nightly_price: Money::new(row.nightly_price_minor, row.currency),
            tags: row.tags,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HotelRow {
    id: Uuid,
    destination_id: Option<Uuid>,
    name: String,
    city: String,
    address: String,
    star_rating: i16,
    nightly_rate_minor: i64,
    currency: String,
    rooms: i32,
    amenities: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<HotelRow> for Hotel {
    fn from(row: HotelRow) -> Self {
        Hotel {
            id: HotelId(row.id),
            destination_id: row.destination_id.map(DestinationId),
            name: row.name,
            city: row.city,
            address: row.address,
            star_rating: u8::try_from(row.star_rating).unwrap_or(0),
            nightly_rate: Money::new(row.nightly_rate_minor, row.currency),
            rooms: to_count(row.rooms),
            amenities: row.amenities,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    airline: String,
    flight_number: String,
    origin: String,
    destination: String,
    departure_at: DateTime<Utc>,
    arrival_at: DateTime<Utc>,
    fare_minor: i64,
    currency: String,
    seats: i32,
    created_at: DateTime<Utc>,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: FlightId(row.id),
            airline: row.airline,
            flight_number: row.flight_number,
            origin: row.origin,
            destination: row.destination,
            departure_at: row.departure_at,
            arrival_at: row.arrival_at,
            fare: Money::new(row.fare_minor, row.currency),
            seats: to_count(row.seats),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CarRow {
    id: Uuid,
    company: String,
    model: String,
    category: String,
    location: String,
    daily_rate_minor: i64,
    currency: String,
    units: i32,
    created_at: DateTime<Utc>,
}

impl From<CarRow> for Car {
    fn from(row: CarRow) -> Self {
        Car {
            id: CarId(row.id),
            company: row.company,
            model: row.model,
            category: row.category,
            location: row.location,
            daily_rate: Money::new(row.daily_rate_minor, row.currency),
            units: to_count(row.units),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CruiseRow {
    id: Uuid,
    cruise_line: String,
    ship: String,
    departure_port: String,
    itinerary: Vec<String>,
    departure_date: NaiveDate,
    nights: i32,
    cabin_price_minor: i64,
    currency: String,
    cabins: i32,
    created_at: DateTime<Utc>,
}

impl From<CruiseRow> for Cruise {
    fn from(row: CruiseRow) -> Self {
        Cruise {
            id: CruiseId(row.id),
            cruise_line: row.cruise_line,
            ship: row.ship,
            departure_port: row.departure_port,
            itinerary: row.itinerary,
            departure_date: row.departure_date,
            nights: to_count(row.nights),
            cabin_price: Money::new(row.cabin_price_minor, row.currency),
            cabins: to_count(row.cabins),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: Uuid,
    destination_id: Uuid,
    title: String,
    description: String,
    nights: i32,
    price_minor: i64,
    currency: String,
    includes: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Package {
            id: PackageId(row.id),
            destination_id: DestinationId(row.destination_id),
            title: row.title,
            description: row.description,
            nights: to_count(row.nights),
            price: Money::new(row.price_minor, row.currency),
            includes: row.includes,
            created_at: row.created_at,
        }
    }
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl CatalogRepository for StoreCatalogRepository {
    async fn create_destination(&self, d: &Destination) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO destinations (id, name, country, description, image_url, nightly_price_minor, currency, tags, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(d.id.0)
        .bind(&d.name)
        .bind(&d.country)
        .bind(&d.description)
        .bind(&d.image_url)
        .bind(d.nightly_price.amount_minor)
        .bind(&d.nightly_price.currency)
        .bind(&d.tags)
        .bind(d.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_destination(&self, id: DestinationId) -> CoreResult<Option<Destination>> {
        let row = sqlx::query_as::<_, DestinationRow>("SELECT * FROM destinations WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn list_destinations(&self) -> CoreResult<Vec<Destination>> {
        let rows = sqlx::query_as::<_, DestinationRow>("SELECT * FROM destinations ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_destinations(&self, term: &str, limit: usize) -> CoreResult<Vec<Destination>> {
        let rows = sqlx::query_as::<_, DestinationRow>(
            r#"
            SELECT * FROM destinations
            WHERE name ILIKE $1 OR country ILIKE $1 OR description ILIKE $1
            ORDER BY name
            LIMIT $2
            "#,
        )
        .bind(like_pattern(term))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_hotel(&self, h: &Hotel) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO hotels (id, destination_id, name, city, address, star_rating, nightly_rate_minor, currency, rooms, amenities, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(h.id.0)
        .bind(h.destination_id.map(|d| d.0))
        .bind(&h.name)
        .bind(&h.city)
        .bind(&h.address)
        .bind(i16::from(h.star_rating))
        .bind(h.nightly_rate.amount_minor)
        .bind(&h.nightly_rate.currency)
        .bind(to_int(h.rooms, "rooms")?)
        .bind(&h.amenities)
        .bind(h.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_hotel(&self, id: HotelId) -> CoreResult<Option<Hotel>> {
        let row = sqlx::query_as::<_, HotelRow>("SELECT * FROM hotels WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn list_hotels(&self, destination: Option<DestinationId>) -> CoreResult<Vec<Hotel>> {
        let rows = sqlx::query_as::<_, HotelRow>(
            "SELECT * FROM hotels WHERE ($1::uuid IS NULL OR destination_id = $1) ORDER BY name",
        )
        .bind(destination.map(|d| d.0))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_hotels(&self, term: &str, limit: usize) -> CoreResult<Vec<Hotel>> {
        let rows = sqlx::query_as::<_, HotelRow>(
            "SELECT * FROM hotels WHERE name ILIKE $1 OR city ILIKE $1 ORDER BY name LIMIT $2",
        )
        .bind(like_pattern(term))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_flight(&self, f: &Flight) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO flights (id, airline, flight_number, origin, destination, departure_at, arrival_at, fare_minor, currency, seats, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(f.id.0)
        .bind(&f.airline)
        .bind(&f.flight_number)
        .bind(&f.origin)
        .bind(&f.destination)
        .bind(f.departure_at)
        .bind(f.arrival_at)
        .bind(f.fare.amount_minor)
        .bind(&f.fare.currency)
        .bind(to_int(f.seats, "seats")?)
        .bind(f.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_flight(&self, id: FlightId) -> CoreResult<Option<Flight>> {
        let row = sqlx::query_as::<_, FlightRow>("SELECT * FROM flights WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn search_flights(&self, query: &FlightQuery) -> CoreResult<Vec<Flight>> {
        let rows = sqlx::query_as::<_, FlightRow>(
            r#"
            SELECT * FROM flights
            WHERE ($1::text IS NULL OR UPPER(origin) = UPPER(TRIM($1)))
              AND ($2::text IS NULL OR UPPER(destination) = UPPER(TRIM($2)))
              AND ($3::date IS NULL OR (departure_at AT TIME ZONE 'UTC')::date = $3)
            ORDER BY departure_at
            "#,
        )
        .bind(query.origin.as_deref())
        .bind(query.destination.as_deref())
        .bind(query.date)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_car(&self, c: &Car) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cars (id, company, model, category, location, daily_rate_minor, currency, units, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(c.id.0)
        .bind(&c.company)
        .bind(&c.model)
        .bind(&c.category)
        .bind(&c.location)
        .bind(c.daily_rate.amount_minor)
        .bind(&c.daily_rate.currency)
        .bind(to_int(c.units, "units")?)
        .bind(c.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_car(&self, id: CarId) -> CoreResult<Option<Car>> {
        let row = sqlx::query_as::<_, CarRow>("SELECT * FROM cars WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn list_cars(&self, location: Option<&str>) -> CoreResult<Vec<Car>> {
        let pattern = location.map(|l| like_pattern(l.trim()));
        let rows = sqlx::query_as::<_, CarRow>(
            "SELECT * FROM cars WHERE ($1::text IS NULL OR location ILIKE $1) ORDER BY daily_rate_minor",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_cruise(&self, c: &Cruise) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cruises (id, cruise_line, ship, departure_port, itinerary, departure_date, nights, cabin_price_minor, currency, cabins, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(c.id.0)
        .bind(&c.cruise_line)
        .bind(&c.ship)
        .bind(&c.departure_port)
        .bind(&c.itinerary)
        .bind(c.departure_date)
        .bind(to_int(c.nights, "nights")?)
        .bind(c.cabin_price.amount_minor)
        .bind(&c.cabin_price.currency)
        .bind(to_int(c.cabins, "cabins")?)
        .bind(c.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_cruise(&self, id: CruiseId) -> CoreResult<Option<Cruise>> {
        let row = sqlx::query_as::<_, CruiseRow>("SELECT * FROM cruises WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn list_cruises(&self, query: &CruiseQuery) -> CoreResult<Vec<Cruise>> {
        let month = query.month.map(|m| m as i32);
        let rows = sqlx::query_as::<_, CruiseRow>(
            r#"
            SELECT * FROM cruises
            WHERE ($1::text IS NULL OR UPPER(departure_port) = UPPER(TRIM($1)))
              AND ($2::int IS NULL OR EXTRACT(MONTH FROM departure_date)::int = $2)
            ORDER BY departure_date
            "#,
        )
        .bind(query.departure_port.as_deref())
        .bind(month)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_package(&self, p: &Package) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO packages (id, destination_id, title, description, nights, price_minor, currency, includes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(p.id.0)
        .bind(p.destination_id.0)
        .bind(&p.title)
        .bind(&p.description)
        .bind(to_int(p.nights, "nights")?)
        .bind(p.price.amount_minor)
        .bind(&p.price.currency)
        .bind(&p.includes)
        .bind(p.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_package(&self, id: PackageId) -> CoreResult<Option<Package>> {
        let row = sqlx::query_as::<_, PackageRow>("SELECT * FROM packages WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn list_packages(&self, destination: Option<DestinationId>) -> CoreResult<Vec<Package>> {
        let rows = sqlx::query_as::<_, PackageRow>(
            "SELECT * FROM packages WHERE ($1::uuid IS NULL OR destination_id = $1) ORDER BY price_minor",
        )
        .bind(destination.map(|d| d.0))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("kyo"), "%kyo%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
