use std::thread;
use std::sync::Mutex;
use std::sync::atomic::{ AtomicUsize, Ordering };

use rayon::prelude::*;

use crate::color::Color;
use crate::scene::Scene;
use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::tracer::Tracer;

/// How pixel work is scheduled across threads.
///
/// Every mode computes each pixel independently from the same
/// read-only scene and camera, so all of them produce identical
/// images; they differ only in wall-clock time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parallelism {
    /// Deterministic row-major loop on the calling thread.
    Sequential,

    /// A fixed-size pool of worker threads claiming pixels from the
    /// shared queue until it runs dry.
    Workers(usize),

    /// A worker pool sized to the machine: available cores minus two,
    /// but at least one.
    Auto,

    /// Declarative parallel iteration over all pixels via rayon.
    ParallelIter,
}

impl Default for Parallelism {
    fn default() -> Parallelism {
        Parallelism::Sequential
    }
}

/// The shared pixel work queue.
///
/// A monotonically advancing index over the flattened (row, col) pixel
/// space. `claim` is the only contended operation; the progress
/// counter is updated separately and only needs eventually-consistent
/// visibility.
pub struct PixelQueue {
    next: AtomicUsize,
    done: AtomicUsize,
    nx: usize,
    total: usize,
}

impl PixelQueue {
    pub fn new(nx: usize, ny: usize) -> PixelQueue {
        PixelQueue {
            next: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
            nx,
            total: nx * ny,
        }
    }

    /// Claims the next unclaimed pixel as (row, col).
    ///
    /// Each pixel is handed out exactly once; `None` means the queue
    /// is exhausted.
    pub fn claim(&self) -> Option<(usize, usize)> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        if index < self.total {
            Some((index / self.nx, index % self.nx))
        } else {
            None
        }
    }

    /// Records one finished pixel.
    pub fn pixel_done(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of pixels finished so far. Eventually consistent.
    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

fn thread_count(parallelism: Parallelism) -> usize {
    match parallelism {
        Parallelism::Workers(count) => count,
        Parallelism::Auto => thread::available_parallelism()
            .map(|cores| cores.get().saturating_sub(2).max(1))
            .unwrap_or(1),
        Parallelism::Sequential | Parallelism::ParallelIter => 1,
    }
}

/// Renders with a pool of worker threads over the shared pixel queue.
///
/// Workers share the read-only scene and camera, the canvas behind a
/// mutex (each pixel index is written exactly once), and the queue.
pub fn render_workers(camera: &Camera, scene: &Scene) -> Canvas {
    let count = thread_count(camera.parallelism());
    let queue = PixelQueue::new(camera.nx(), camera.ny());
    let canvas = Mutex::new(Canvas::new(camera.nx(), camera.ny()));

    log::debug!("rendering with {} worker threads", count);

    thread::scope(|scope| {
        for _ in 0..count {
            scope.spawn(|| {
                let tracer = Tracer::with_config(scene, camera.trace_config());

                while let Some((row, col)) = queue.claim() {
                    let color = camera.render_pixel(&tracer, col, row);
                    canvas.lock().unwrap().write_pixel(col, row, &color);
                    queue.pixel_done();
                }
            });
        }
    });

    log::debug!("{} of {} pixels rendered", queue.completed(), queue.total());
    canvas.into_inner().unwrap()
}

/// Renders with rayon's parallel iterator over all pixels.
pub fn render_parallel_iter(camera: &Camera, scene: &Scene) -> Canvas {
    let nx = camera.nx();

    let pixels: Vec<Color> = (0..nx * camera.ny())
        .into_par_iter()
        .map(|index| {
            let tracer = Tracer::with_config(scene, camera.trace_config());
            camera.render_pixel(&tracer, index % nx, index / nx)
        })
        .collect();

    Canvas::from_pixels(nx, camera.ny(), pixels)
}

/* Tests */

#[test]
fn queue_hands_out_each_pixel_once() {
    let queue = PixelQueue::new(3, 2);

    let mut claimed = Vec::new();
    while let Some(pixel) = queue.claim() {
        claimed.push(pixel);
    }

    claimed.sort();
    assert_eq!(claimed, vec![
        (0, 0), (0, 1), (0, 2),
        (1, 0), (1, 1), (1, 2),
    ]);

    // Exhausted queues stay exhausted.
    assert_eq!(queue.claim(), None);
}

#[test]
fn queue_tracks_progress() {
    let queue = PixelQueue::new(2, 2);
    assert_eq!(queue.completed(), 0);

    queue.claim();
    queue.pixel_done();
    queue.claim();
    queue.pixel_done();

    assert_eq!(queue.completed(), 2);
    assert_eq!(queue.total(), 4);
}

#[test]
fn fixed_worker_count_is_respected() {
    assert_eq!(thread_count(Parallelism::Workers(3)), 3);
    assert!(thread_count(Parallelism::Auto) >= 1);
}

#[cfg(test)]
mod determinism {
    use super::*;
    use crate::tuple::{ Point3D, Vector3D };
    use crate::shape::Shape;
    use crate::light::{ Light, Material };
    use crate::camera::CameraBuilder;

    fn scene() -> Scene {
        let mut scene = Scene::new()
            .with_background(Color::rgb(0.05, 0.05, 0.1));

        scene.geometries.add(
            Shape::sphere(Point3D::new(0.0, 0.0, 6.0), 2.0).unwrap()
                .with_material(Material {
                    kd: Color::uniform(0.6),
                    ks: Color::uniform(0.3),
                    kr: Color::uniform(0.2),
                    shininess: 30,
                    ..Default::default()
                })
        );
        scene.geometries.add(Shape::plane(
            Point3D::new(0.0, -2.0, 0.0),
            Vector3D::new(0.0, 1.0, 0.0),
        ).unwrap().with_material(Material {
            kd: Color::uniform(0.5),
            ..Default::default()
        }));
        scene.lights.push(
            Light::point(Color::white(), Point3D::new(-5.0, 8.0, 0.0)));

        scene
    }

    fn builder() -> CameraBuilder {
        Camera::builder()
            .position(Point3D::origin())
            .direction(
                Vector3D::new(0.0, 0.0, 1.0), Vector3D::new(0.0, 1.0, 0.0))
            .view_plane(4.0, 4.0)
            .vp_distance(2.0)
            .resolution(9, 9)
    }

    #[test]
    fn every_scheduling_mode_renders_the_same_image() {
        let scene = scene();

        let sequential = builder()
            .parallelism(Parallelism::Sequential)
            .build().unwrap()
            .render(&scene);

        let modes = [
            Parallelism::Workers(1),
            Parallelism::Workers(2),
            Parallelism::Workers(8),
            Parallelism::Auto,
            Parallelism::ParallelIter,
        ];

        for &parallelism in modes.iter() {
            let image = builder()
                .parallelism(parallelism)
                .build().unwrap()
                .render(&scene);

            assert_eq!(image, sequential, "mismatch for {:?}", parallelism);
        }
    }
}
