//! Per-province fan-out with partial-failure tolerance.

use std::future::Future;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::cache::{RegionKey, ResourceClass};
use crate::error::FetchError;
use crate::region::{self, Province};

/// Issue one request per province in `region`, all at once, and join them.
///
/// A failed province is logged and dropped; the batch continues. Output
/// keeps the region's province order regardless of completion order. The
/// batch only fails when the region is unknown or every province failed.
pub async fn fan_out<T, F, Fut>(
  class: ResourceClass,
  region: &RegionKey,
  fetch_one: F,
) -> Result<Vec<T>, FetchError>
where
  F: Fn(Province) -> Fut,
  Fut: Future<Output = Result<T, FetchError>>,
{
  let provinces = region::resolve(region);
  if provinces.is_empty() {
    return Err(FetchError::UnknownRegion(region.to_string()));
  }

  debug!(%class, %region, provinces = provinces.len(), "fanning out");
  let results = join_all(provinces.iter().map(|p| fetch_one(*p))).await;

  let mut records = Vec::with_capacity(results.len());
  for (province, result) in provinces.iter().zip(results) {
    match result {
      Ok(record) => records.push(record),
      Err(e) => warn!(%class, province = province.name, error = %e, "skipping province"),
    }
  }

  if records.is_empty() {
    return Err(FetchError::EmptyBatch {
      region: region.to_string(),
      attempted: provinces.len(),
    });
  }

  debug!(%class, %region, records = records.len(), "fan-out joined");
  Ok(records)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test(start_paused = true)]
  async fn test_order_follows_provinces_not_completion() {
    // Southern provinces (lower latitude) finish last
    let records = fan_out(ResourceClass::Weather, &"central".into(), |p| async move {
      let delay = ((20.0 - p.lat) * 100.0) as u64;
      tokio::time::sleep(Duration::from_millis(delay)).await;
      Ok::<_, FetchError>(p.name)
    })
    .await
    .unwrap();

    let expected: Vec<&str> = region::resolve(&"central".into())
      .iter()
      .map(|p| p.name)
      .collect();
    assert_eq!(records, expected);
  }

  #[tokio::test]
  async fn test_failures_are_dropped() {
    let records = fan_out(ResourceClass::UvIndex, &"north".into(), |p| async move {
      if p.name.starts_with("Chiang") {
        Err(FetchError::Decode("missing".into()))
      } else {
        Ok(p.name)
      }
    })
    .await
    .unwrap();

    assert_eq!(records, vec!["Lampang", "Phitsanulok", "Nan"]);
  }

  #[tokio::test]
  async fn test_all_failed_is_an_error() {
    let result = fan_out(ResourceClass::AirQuality, &"east".into(), |_| async {
      Err::<(), _>(FetchError::Status { status: 503 })
    })
    .await;

    assert!(matches!(
      result,
      Err(FetchError::EmptyBatch { attempted: 4, .. })
    ));
  }

  #[tokio::test]
  async fn test_unknown_region() {
    let result = fan_out(ResourceClass::Weather, &"nowhere".into(), |p| async move {
      Ok::<_, FetchError>(p.name)
    })
    .await;

    assert!(matches!(result, Err(FetchError::UnknownRegion(_))));
  }
}
