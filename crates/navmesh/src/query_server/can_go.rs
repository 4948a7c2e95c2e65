use navmesh_common::{to_2d, Vec3};

use crate::nav_mesh_types::NavTerrainTypeMask;
use crate::nav_ptr::NavTrianglePtr;
use crate::nav_safe_ptr::NavTriangleSafePtr;
use crate::queries::{
    segment_ends, DiskCanGoQuery, RayCanGoQuery, SegmentCanGoQuery, DEFAULT_SAFETY_DIST,
};
use crate::status::QueryServerResult;
use crate::traversal::{CapsuleIntersector, RayIntersector, SegmentIntersector};

use super::{is_allowed, normalized_2d, EdgeSearch, NavMeshQueryServer};

impl<'m> NavMeshQueryServer<'m> {
    /// Resolves both ends of a CanGo query and writes them back. Returns them when the
    /// query can run.
    #[allow(clippy::too_many_arguments)]
    fn locate_can_go_ends(
        &self,
        start_pos: Vec3,
        start_triangle: &mut Option<NavTriangleSafePtr>,
        dest_pos: Vec3,
        dest_triangle: &mut Option<NavTriangleSafePtr>,
        search_range: f32,
        terrain_mask: NavTerrainTypeMask,
    ) -> Option<(NavTrianglePtr<'m>, NavTrianglePtr<'m>)> {
        let start = self.resolve_triangle(start_triangle.as_ref(), start_pos, search_range);
        *start_triangle = start.map(|triangle| triangle.to_safe_ptr());
        let start = start.filter(|triangle| is_allowed(triangle, terrain_mask))?;

        let dest = self.resolve_triangle(dest_triangle.as_ref(), dest_pos, search_range);
        *dest_triangle = dest.map(|triangle| triangle.to_safe_ptr());
        let dest = dest.filter(|triangle| is_allowed(triangle, terrain_mask))?;
        Some((start, dest))
    }

    /// `(can_go, collision)` after a propagation toward `dest`
    fn can_go_outputs(&self, search: &EdgeSearch<'m>, dest: &NavTrianglePtr<'m>) -> (bool, bool) {
        let collision = search.collision.is_some();
        (!collision && self.is_closed(search, dest.key()), collision)
    }

    pub fn ray_can_go(&mut self, query: &mut RayCanGoQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let Some((start, dest)) = self.locate_can_go_ends(
            query.start_pos,
            &mut query.start_triangle,
            query.dest_pos,
            &mut query.dest_triangle,
            query.search_range,
            query.terrain_type_mask,
        ) else {
            return Ok(());
        };

        let ray = RayIntersector::new(query.start_pos, query.dest_pos);
        let search = self.run_edge_search(start, ray, query.terrain_type_mask, query.memory.enabled);
        query.memory.count = self.propagation_count;
        let search = search?;
        (query.can_go, query.collision) = self.can_go_outputs(&search, &dest);
        Ok(())
    }

    pub fn disk_can_go(&mut self, query: &mut DiskCanGoQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        let Some((start, dest)) = self.locate_can_go_ends(
            query.start_pos,
            &mut query.start_triangle,
            query.dest_pos,
            &mut query.dest_triangle,
            query.search_range,
            query.terrain_type_mask,
        ) else {
            return Ok(());
        };

        let motion = to_2d(query.dest_pos) - to_2d(query.start_pos);
        let dir = normalized_2d(motion);
        let capsule = if query.adapt_query_to_start_position {
            self.start_adapted_capsule(
                start,
                query.start_pos,
                dir,
                motion.length(),
                query.radius,
                DEFAULT_SAFETY_DIST,
                query.terrain_type_mask,
            )?
        } else {
            CapsuleIntersector::new(query.start_pos, dir, motion.length(), query.radius)
        };

        let search = self.run_edge_search(start, capsule, query.terrain_type_mask, query.memory.enabled);
        query.memory.count = self.propagation_count;
        let search = search?;
        (query.can_go, query.collision) = self.can_go_outputs(&search, &dest);
        Ok(())
    }

    pub fn segment_can_go(&mut self, query: &mut SegmentCanGoQuery) -> QueryServerResult {
        query.clean_output();
        self.reset_outputs();
        (query.start_a, query.start_b) = segment_ends(query.start_pos, query.dest_pos, query.radius);
        let Some((start, dest)) = self.locate_can_go_ends(
            query.start_pos,
            &mut query.start_triangle,
            query.dest_pos,
            &mut query.dest_triangle,
            query.search_range,
            query.terrain_type_mask,
        ) else {
            return Ok(());
        };

        let motion = to_2d(query.dest_pos) - to_2d(query.start_pos);
        let segment = SegmentIntersector::new(
            query.start_pos,
            normalized_2d(motion),
            motion.length(),
            query.radius,
        );
        let search = self.run_edge_search(start, segment, query.terrain_type_mask, query.memory.enabled);
        query.memory.count = self.propagation_count;
        let search = search?;
        (query.can_go, query.collision) = self.can_go_outputs(&search, &dest);
        Ok(())
    }
}
