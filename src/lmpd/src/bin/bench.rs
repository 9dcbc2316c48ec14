use std::time::SystemTime;

use lmpd::pworld::PWorld;
use lmpd::V2;
use protocol::scene::{LinkKind, SceneModel};

// hanging lattice: top row pinned, springs along rows, stiff rods
// along columns
fn lattice(nx: usize, ny: usize, spacing: f64) -> SceneModel {
	let mut scene = SceneModel::default();
	for ix in 0..nx {
		for iy in 0..ny {
			let pos = [1.0 + ix as f64 * spacing, 1.0 + iy as f64 * spacing];
			scene.push_particle(pos, 1.0, iy != 0);
		}
	}
	let id = |ix: usize, iy: usize| ix * ny + iy;
	for ix in 0..nx {
		for iy in 0..ny {
			if ix + 1 < nx {
				scene.push_link(
					id(ix, iy),
					id(ix + 1, iy),
					LinkKind::Spring { ks: 100.0, kd: 1.0 },
				);
			}
			if iy + 1 < ny {
				scene.push_link(id(ix, iy), id(ix, iy + 1), LinkKind::Stiff);
			}
		}
	}
	scene
}

fn main() {
	let mut world = PWorld::new(V2::new(20.0, 20.0), 0.1).unwrap();
	world.load_scene(&lattice(10, 5, 0.3)).unwrap();
	let dt = 1e-3;
	let rframes = 2000;
	let start = SystemTime::now();
	for _ in 0..rframes {
		world.step(dt);
	}
	let time = rframes as f64 * dt;
	let duration = SystemTime::now().duration_since(start).unwrap().as_micros();
	eprintln!("{:.3}%", duration as f64 / time / 1e4);
}
