use std::{io::Cursor, sync::atomic::AtomicUsize, time::Duration};

use super::*;
use crate::assets::source::MemorySource;

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Counts reads and stalls each one so concurrent callers overlap.
struct SlowSource {
    inner: MemorySource,
    reads: AtomicUsize,
}

impl ByteSource for SlowSource {
    fn read(&self, reference: &str) -> anyhow::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        self.inner.read(reference)
    }
}

#[test]
fn second_load_hits_cache() {
    let src = MemorySource::new().with("images/bar.png", png_bytes(4, 2));
    let cache = TextureCache::new(Arc::new(src));

    let a = cache.load("bar").unwrap();
    let b = cache.load("bar").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.size(), (4.0, 2.0));
    assert_eq!(cache.decode_count(), 1);
    assert!(cache.contains("bar"));
}

#[test]
fn missing_asset_is_an_asset_load_error() {
    let cache = TextureCache::new(Arc::new(MemorySource::new()));
    let err = cache.load("introBar").unwrap_err();
    match err {
        ScreenError::AssetLoad { key, .. } => assert_eq!(key, "introBar"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!cache.contains("introBar"));
}

#[test]
fn undecodable_asset_is_an_asset_load_error() {
    let src = MemorySource::new().with("images/bar.png", b"nope".to_vec());
    let cache = TextureCache::new(Arc::new(src));
    assert!(matches!(
        cache.load("bar"),
        Err(ScreenError::AssetLoad { .. })
    ));
    assert_eq!(cache.decode_count(), 0);
}

#[test]
fn concurrent_loads_decode_once() {
    let source = Arc::new(SlowSource {
        inner: MemorySource::new().with("images/caption.png", png_bytes(8, 8)),
        reads: AtomicUsize::new(0),
    });
    let cache = TextureCache::new(source.clone());

    let loaded: Vec<Arc<Texture>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| cache.load("caption").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    assert_eq!(cache.decode_count(), 1);
    for tex in &loaded[1..] {
        assert!(Arc::ptr_eq(&loaded[0], tex));
    }
}

#[test]
fn warm_stops_at_first_failure() {
    let src = MemorySource::new().with("images/bar.png", png_bytes(1, 1));
    let cache = TextureCache::new(Arc::new(src));
    assert!(cache.warm(["bar", "book"]).is_err());
    assert!(cache.contains("bar"));
}
